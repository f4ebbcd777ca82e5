//! Pure session transitions.
//!
//! Every function here takes the state it changes explicitly and performs no
//! I/O. Randomness comes in through the `rng` argument so selection is
//! reproducible with a seeded generator. A rejected call leaves its inputs
//! untouched.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;

use quiz_core::model::{
    Bank, ProgressMap, QuestionId, QuestionProgress, SessionState, Stats, TimerState,
};

/// Why a session action was refused as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Advance or answer with no question on screen.
    NoCurrentQuestion,
    /// Start while a question is already current.
    AlreadyStarted,
    /// Answer for a question other than the current one.
    NotCurrent { question_id: QuestionId },
    /// Second answer to the same presentation.
    AlreadyAnswered,
    /// Answer to a retired question.
    Excluded { question_id: QuestionId },
    /// Display index outside the shown options.
    InvalidOption { index: usize },
}

/// Outcome of `start` and `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A question became current.
    Selected(QuestionId),
    /// The active pool is empty; nothing is current.
    Finished,
    Rejected(Rejection),
}

/// Effect of an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub correct: bool,
    pub consecutive_correct: u8,
    pub newly_excluded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded(AnswerRecord),
    Rejected(Rejection),
}

/// Add a fresh record for every bank question that has none.
///
/// Existing records are kept as they are, including records for questions no
/// longer in the bank.
#[must_use]
pub fn initialize_progress(bank: &Bank, mut existing: ProgressMap) -> ProgressMap {
    for id in bank.ids() {
        existing
            .entry(id)
            .or_insert_with(|| QuestionProgress::new(id));
    }
    existing
}

/// Pick a question uniformly at random from the active pool.
///
/// Returns `None` when every question is excluded.
pub fn pick_next<R: Rng + ?Sized>(
    bank: &Bank,
    state: &SessionState,
    rng: &mut R,
) -> Option<QuestionId> {
    state.active_ids(bank).choose(rng).copied()
}

/// Make the first question current.
pub fn start<R: Rng + ?Sized>(bank: &Bank, state: &mut SessionState, rng: &mut R) -> Selection {
    if state.current_question_id.is_some() {
        return Selection::Rejected(Rejection::AlreadyStarted);
    }
    select(bank, state, rng)
}

/// Replace the current question with a fresh pick.
///
/// The previous question may be picked again.
pub fn advance<R: Rng + ?Sized>(bank: &Bank, state: &mut SessionState, rng: &mut R) -> Selection {
    if state.current_question_id.is_none() {
        return Selection::Rejected(Rejection::NoCurrentQuestion);
    }
    select(bank, state, rng)
}

fn select<R: Rng + ?Sized>(bank: &Bank, state: &mut SessionState, rng: &mut R) -> Selection {
    let next = pick_next(bank, state, rng);
    state.current_question_id = next;
    state.current_answered = false;
    match next {
        Some(id) => Selection::Selected(id),
        None => Selection::Finished,
    }
}

/// Score one answer to the current question.
///
/// Leaves `current_question_id` alone; moving on is a separate `advance`.
pub fn record_answer(
    state: &mut SessionState,
    stats: &mut Stats,
    question_id: QuestionId,
    correct: bool,
) -> AnswerOutcome {
    let Some(current) = state.current_question_id else {
        return AnswerOutcome::Rejected(Rejection::NoCurrentQuestion);
    };
    if current != question_id {
        return AnswerOutcome::Rejected(Rejection::NotCurrent { question_id });
    }
    if state.current_answered {
        return AnswerOutcome::Rejected(Rejection::AlreadyAnswered);
    }

    let progress = state
        .progress
        .entry(question_id)
        .or_insert_with(|| QuestionProgress::new(question_id));
    let Ok(change) = progress.apply_answer(correct) else {
        return AnswerOutcome::Rejected(Rejection::Excluded { question_id });
    };

    stats.record(correct);
    state.current_answered = true;

    AnswerOutcome::Recorded(AnswerRecord {
        question_id,
        correct,
        consecutive_correct: change.current,
        newly_excluded: change.newly_excluded,
    })
}

/// Fresh session: every bank question back in the pool, zero stats, timer at `now`.
#[must_use]
pub fn reset(bank: &Bank, now: DateTime<Utc>) -> (SessionState, Stats, TimerState) {
    let state = SessionState {
        progress: initialize_progress(bank, ProgressMap::new()),
        current_question_id: None,
        current_answered: false,
    };
    (state, Stats::new(), TimerState::started_at(now))
}
