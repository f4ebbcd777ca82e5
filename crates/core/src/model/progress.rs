use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Bank;

/// Consecutive correct answers needed to retire a question from the active pool.
pub const MASTERY_THRESHOLD: u8 = 5;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("consecutive correct count {count} exceeds mastery threshold {MASTERY_THRESHOLD}")]
    CountOutOfRange { count: u8 },

    #[error("question reached the mastery threshold but is not excluded")]
    MasteredNotExcluded,

    #[error("question is excluded below the mastery threshold ({count})")]
    ExcludedBelowThreshold { count: u8 },

    #[error("question {0} is already excluded")]
    AlreadyExcluded(QuestionId),
}

//
// ─── QUESTION PROGRESS ─────────────────────────────────────────────────────────
//

/// Mastery counter for a single question.
///
/// Fields are private so the only way to reach the threshold is through
/// [`QuestionProgress::apply_answer`], which excludes in the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionProgress {
    question_id: QuestionId,
    consecutive_correct: u8,
    is_excluded: bool,
}

/// Result of applying one answer to a progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressChange {
    pub previous: u8,
    pub current: u8,
    pub newly_excluded: bool,
}

impl QuestionProgress {
    /// Fresh record: no correct answers yet, still in the active pool.
    #[must_use]
    pub fn new(question_id: QuestionId) -> Self {
        Self {
            question_id,
            consecutive_correct: 0,
            is_excluded: false,
        }
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the counter is out of range or disagrees with
    /// the exclusion flag.
    pub fn from_persisted(
        question_id: QuestionId,
        consecutive_correct: u8,
        is_excluded: bool,
    ) -> Result<Self, ProgressError> {
        if consecutive_correct > MASTERY_THRESHOLD {
            return Err(ProgressError::CountOutOfRange {
                count: consecutive_correct,
            });
        }
        let mastered = consecutive_correct == MASTERY_THRESHOLD;
        if mastered && !is_excluded {
            return Err(ProgressError::MasteredNotExcluded);
        }
        if is_excluded && !mastered {
            return Err(ProgressError::ExcludedBelowThreshold {
                count: consecutive_correct,
            });
        }
        Ok(Self {
            question_id,
            consecutive_correct,
            is_excluded,
        })
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn consecutive_correct(&self) -> u8 {
        self.consecutive_correct
    }

    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.is_excluded
    }

    /// Count a correct answer up by one or reset to zero on a miss.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::AlreadyExcluded` if the question was retired.
    pub fn apply_answer(&mut self, correct: bool) -> Result<ProgressChange, ProgressError> {
        if self.is_excluded {
            return Err(ProgressError::AlreadyExcluded(self.question_id));
        }
        let previous = self.consecutive_correct;
        self.consecutive_correct = if correct {
            previous.saturating_add(1).min(MASTERY_THRESHOLD)
        } else {
            0
        };
        let newly_excluded = self.consecutive_correct >= MASTERY_THRESHOLD;
        self.is_excluded = newly_excluded;
        Ok(ProgressChange {
            previous,
            current: self.consecutive_correct,
            newly_excluded,
        })
    }
}

/// Per-question progress keyed by id.
pub type ProgressMap = BTreeMap<QuestionId, QuestionProgress>;

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Mutable state of one study session.
///
/// `current_answered` latches once the current presentation has been scored,
/// so the same presentation cannot be answered twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub progress: ProgressMap,
    pub current_question_id: Option<QuestionId>,
    pub current_answered: bool,
}

impl SessionState {
    #[must_use]
    pub fn progress_for(&self, id: QuestionId) -> Option<&QuestionProgress> {
        self.progress.get(&id)
    }

    /// Returns true if the question is in the active pool.
    ///
    /// A bank question without a progress record counts as active.
    #[must_use]
    pub fn is_active(&self, id: QuestionId) -> bool {
        self.progress.get(&id).is_none_or(|p| !p.is_excluded())
    }

    /// Active question ids in bank order.
    #[must_use]
    pub fn active_ids(&self, bank: &Bank) -> Vec<QuestionId> {
        bank.ids().filter(|id| self.is_active(*id)).collect()
    }

    #[must_use]
    pub fn active_count(&self, bank: &Bank) -> usize {
        bank.ids().filter(|id| self.is_active(*id)).count()
    }

    /// The session is finished exactly when the active pool is empty.
    #[must_use]
    pub fn is_finished(&self, bank: &Bank) -> bool {
        self.active_count(bank) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_correct_answers_exclude_in_the_same_step() {
        let mut progress = QuestionProgress::new(QuestionId::new(12));
        let mut seen = Vec::new();
        for _ in 0..MASTERY_THRESHOLD {
            let change = progress.apply_answer(true).unwrap();
            seen.push((change.current, change.newly_excluded));
        }
        assert_eq!(
            seen,
            vec![(1, false), (2, false), (3, false), (4, false), (5, true)]
        );
        assert!(progress.is_excluded());
        assert_eq!(progress.consecutive_correct(), 5);
    }

    #[test]
    fn wrong_answer_resets_counter() {
        let mut progress = QuestionProgress::from_persisted(QuestionId::new(1), 4, false).unwrap();
        let change = progress.apply_answer(false).unwrap();
        assert_eq!(change.previous, 4);
        assert_eq!(change.current, 0);
        assert!(!progress.is_excluded());
    }

    #[test]
    fn excluded_question_rejects_further_answers() {
        let mut progress = QuestionProgress::from_persisted(QuestionId::new(1), 5, true).unwrap();
        let err = progress.apply_answer(true).unwrap_err();
        assert_eq!(err, ProgressError::AlreadyExcluded(QuestionId::new(1)));
        assert_eq!(progress.consecutive_correct(), 5);
    }

    #[test]
    fn from_persisted_rejects_inconsistent_records() {
        let id = QuestionId::new(1);
        assert!(matches!(
            QuestionProgress::from_persisted(id, 6, true),
            Err(ProgressError::CountOutOfRange { count: 6 })
        ));
        assert!(matches!(
            QuestionProgress::from_persisted(id, 5, false),
            Err(ProgressError::MasteredNotExcluded)
        ));
        assert!(matches!(
            QuestionProgress::from_persisted(id, 2, true),
            Err(ProgressError::ExcludedBelowThreshold { count: 2 })
        ));
    }

    #[test]
    fn missing_progress_counts_as_active() {
        let state = SessionState::default();
        assert!(state.is_active(QuestionId::new(99)));
    }
}
