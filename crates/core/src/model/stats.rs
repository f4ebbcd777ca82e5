use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatsError {
    #[error("correct answers ({correct}) exceed total answers ({total})")]
    CorrectExceedsTotal { total: u32, correct: u32 },
}

/// Running answer counters for the accuracy signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    total_answers: u32,
    correct_answers: u32,
}

impl Stats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate counters from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::CorrectExceedsTotal` if the counters are inconsistent.
    pub fn from_persisted(total_answers: u32, correct_answers: u32) -> Result<Self, StatsError> {
        if correct_answers > total_answers {
            return Err(StatsError::CorrectExceedsTotal {
                total: total_answers,
                correct: correct_answers,
            });
        }
        Ok(Self {
            total_answers,
            correct_answers,
        })
    }

    /// Count one answer.
    pub fn record(&mut self, correct: bool) {
        if self.total_answers == u32::MAX {
            return;
        }
        self.total_answers += 1;
        if correct {
            self.correct_answers += 1;
        }
    }

    #[must_use]
    pub fn total_answers(&self) -> u32 {
        self.total_answers
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    /// Accuracy rounded to the nearest whole percent; 0 before any answer.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        let percent = round_percent(
            u64::from(self.correct_answers),
            u64::from(self.total_answers),
        );
        u32::try_from(percent).unwrap_or(100)
    }
}

/// `round(part / whole * 100)` with halves rounded up; 0 when `whole` is 0.
#[must_use]
pub fn round_percent(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    (part.saturating_mul(200) + whole) / whole.saturating_mul(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_total_and_correct() {
        let mut stats = Stats::new();
        stats.record(true);
        stats.record(false);
        stats.record(true);
        assert_eq!(stats.total_answers(), 3);
        assert_eq!(stats.correct_answers(), 2);
        assert_eq!(stats.accuracy_percent(), 67);
    }

    #[test]
    fn accuracy_is_zero_without_answers() {
        assert_eq!(Stats::new().accuracy_percent(), 0);
    }

    #[test]
    fn round_percent_rounds_half_up() {
        assert_eq!(round_percent(1, 8), 13);
        assert_eq!(round_percent(1, 3), 33);
        assert_eq!(round_percent(2, 3), 67);
        assert_eq!(round_percent(5, 5), 100);
    }

    #[test]
    fn from_persisted_rejects_more_correct_than_total() {
        assert_eq!(
            Stats::from_persisted(1, 2),
            Err(StatsError::CorrectExceedsTotal {
                total: 1,
                correct: 2
            })
        );
    }
}
