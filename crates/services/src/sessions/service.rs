use std::fmt;

use rand::Rng;
use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{Bank, Question, SessionState, Stats, TimerState};
use storage::session_store::SessionStore;

use super::engine::{self, AnswerOutcome, Rejection, Selection};
use super::presentation::{Presentation, PresentationToken};
use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Write-through quiz session over a loaded bank.
///
/// Wraps the pure transitions in `engine` and persists every accepted change
/// through `SessionStore` before returning. Rejected actions change nothing
/// and write nothing.
///
/// Question selection and option shuffling draw from separate generators so
/// each can be seeded on its own.
pub struct QuizSession<R> {
    bank: Bank,
    state: SessionState,
    stats: Stats,
    timer: TimerState,
    presentation: Option<Presentation>,
    last_token: PresentationToken,
    store: SessionStore,
    clock: Clock,
    selection_rng: R,
    shuffle_rng: R,
}

impl<R: Rng> QuizSession<R> {
    /// Rehydrate a session for `bank` from the store, or start fresh.
    ///
    /// Missing or unreadable entries fall back to their initial value. A stored
    /// current question that is retired or gone from the bank is cleared.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the backend cannot be read or written.
    pub async fn open(
        bank: Bank,
        store: SessionStore,
        clock: Clock,
        selection_rng: R,
        shuffle_rng: R,
    ) -> Result<Self, SessionError> {
        let mut state = store.load_session().await?.unwrap_or_default();
        state.progress = engine::initialize_progress(&bank, std::mem::take(&mut state.progress));

        let stale = state
            .current_question_id
            .filter(|id| !bank.contains(*id) || !state.is_active(*id));
        if let Some(id) = stale {
            warn!(question_id = %id, "stored current question is no longer selectable");
            state.current_question_id = None;
            state.current_answered = false;
        }

        let stats = match store.load_stats().await? {
            Some(stats) => stats,
            None => {
                let stats = Stats::new();
                store.save_stats(&stats).await?;
                stats
            }
        };

        let timer = match store.load_timer().await? {
            Some(timer) => timer,
            None => {
                let timer = TimerState::started_at(clock.now());
                store.save_timer(&timer).await?;
                timer
            }
        };

        store.save_session(&state).await?;

        let mut session = Self {
            bank,
            state,
            stats,
            timer,
            presentation: None,
            last_token: 0,
            store,
            clock,
            selection_rng,
            shuffle_rng,
        };
        session.present_current();

        info!(
            questions = session.bank.len(),
            active = session.state.active_count(&session.bank),
            resumed = session.state.current_question_id.is_some(),
            "quiz session opened"
        );
        Ok(session)
    }

    #[must_use]
    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    #[must_use]
    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    #[must_use]
    pub fn presentation(&self) -> Option<&Presentation> {
        self.presentation.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.state
            .current_question_id
            .and_then(|id| self.bank.get(id))
    }

    /// True once the current presentation has been answered.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.state.current_answered
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished(&self.bank)
    }

    /// Signals for display, computed at the clock's current time.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::compute(
            &self.bank,
            &self.state,
            &self.stats,
            &self.timer,
            self.clock.now(),
        )
    }

    /// Present the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the new state cannot be persisted.
    pub async fn start(&mut self) -> Result<Selection, SessionError> {
        let selection = engine::start(&self.bank, &mut self.state, &mut self.selection_rng);
        self.after_selection(selection).await
    }

    /// Move on to a freshly picked question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the new state cannot be persisted.
    pub async fn advance(&mut self) -> Result<Selection, SessionError> {
        let selection = engine::advance(&self.bank, &mut self.state, &mut self.selection_rng);
        self.after_selection(selection).await
    }

    /// Advance only if `token` still names the current, already answered presentation.
    ///
    /// Used by deferred auto-advance so a stale callback cannot skip a question
    /// the user has not seen answered, or touch a session that was reset.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the new state cannot be persisted.
    pub async fn advance_if_current(
        &mut self,
        token: PresentationToken,
    ) -> Result<Option<Selection>, SessionError> {
        let is_current = self
            .presentation
            .is_some_and(|p| p.token() == token);
        if !is_current || !self.state.current_answered {
            debug!(token, "ignoring stale auto-advance");
            return Ok(None);
        }
        self.advance().await.map(Some)
    }

    /// Answer the current question with the option shown at `index` (0-based).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the new state cannot be persisted.
    pub async fn choose_option(&mut self, index: usize) -> Result<AnswerOutcome, SessionError> {
        let Some(presentation) = self.presentation else {
            return Ok(AnswerOutcome::Rejected(Rejection::NoCurrentQuestion));
        };
        let Some(question) = self.bank.get(presentation.question_id()) else {
            return Ok(AnswerOutcome::Rejected(Rejection::NoCurrentQuestion));
        };
        let Some(option) = presentation.option_at(question, index) else {
            return Ok(AnswerOutcome::Rejected(Rejection::InvalidOption { index }));
        };
        let correct = option.is_correct;

        let outcome = engine::record_answer(
            &mut self.state,
            &mut self.stats,
            presentation.question_id(),
            correct,
        );
        match outcome {
            AnswerOutcome::Recorded(record) => {
                self.store.save_session(&self.state).await?;
                self.store.save_stats(&self.stats).await?;
                debug!(
                    question_id = %record.question_id,
                    correct = record.correct,
                    streak = record.consecutive_correct,
                    "answer recorded"
                );
                if record.newly_excluded {
                    info!(question_id = %record.question_id, "question mastered");
                }
            }
            AnswerOutcome::Rejected(reason) => {
                debug!(?reason, "answer rejected");
            }
        }
        Ok(outcome)
    }

    /// Drop all progress, stats, and the timer, and start over on the same bank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be cleared or written.
    pub async fn reset(&mut self) -> Result<(), SessionError> {
        self.store.clear().await?;
        let (state, stats, timer) = engine::reset(&self.bank, self.clock.now());
        self.state = state;
        self.stats = stats;
        self.timer = timer;
        self.presentation = None;

        self.store.save_session(&self.state).await?;
        self.store.save_stats(&self.stats).await?;
        self.store.save_timer(&self.timer).await?;
        info!(questions = self.bank.len(), "quiz session reset");
        Ok(())
    }

    async fn after_selection(&mut self, selection: Selection) -> Result<Selection, SessionError> {
        match selection {
            Selection::Selected(id) => {
                self.present_current();
                self.store.save_session(&self.state).await?;
                debug!(question_id = %id, "question presented");
            }
            Selection::Finished => {
                self.presentation = None;
                self.store.save_session(&self.state).await?;
                info!(answers = self.stats.total_answers(), "quiz finished");
            }
            Selection::Rejected(reason) => {
                debug!(?reason, "selection rejected");
            }
        }
        Ok(selection)
    }

    fn present_current(&mut self) {
        let question = self
            .state
            .current_question_id
            .and_then(|id| self.bank.get(id));
        self.presentation = match question {
            Some(question) => {
                self.last_token += 1;
                Some(Presentation::shuffled(
                    question,
                    self.last_token,
                    &mut self.shuffle_rng,
                ))
            }
            None => None,
        };
    }
}

impl<R> fmt::Debug for QuizSession<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("bank_len", &self.bank.len())
            .field("current", &self.state.current_question_id)
            .field("answered", &self.state.current_answered)
            .field("stats", &self.stats)
            .field("timer", &self.timer)
            .field("last_token", &self.last_token)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
