use chrono::{DateTime, Utc};

use quiz_core::model::{Bank, SessionState, Stats, TimerState, round_percent};

/// Read-only signals for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    /// `round(completed / total * 100)`, 0 for an empty bank.
    pub percent: u64,
    pub total_answers: u32,
    pub correct_answers: u32,
    pub accuracy_percent: u32,
    /// `HH:MM:SS` since the session started.
    pub elapsed: String,
    pub is_finished: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn compute(
        bank: &Bank,
        state: &SessionState,
        stats: &Stats,
        timer: &TimerState,
        now: DateTime<Utc>,
    ) -> Self {
        let total = bank.len();
        let active = state.active_count(bank);
        let completed = total.saturating_sub(active);
        Self {
            total,
            active,
            completed,
            percent: round_percent(
                u64::try_from(completed).unwrap_or(u64::MAX),
                u64::try_from(total).unwrap_or(u64::MAX),
            ),
            total_answers: stats.total_answers(),
            correct_answers: stats.correct_answers(),
            accuracy_percent: stats.accuracy_percent(),
            elapsed: timer.format_elapsed(now),
            is_finished: active == 0,
        }
    }
}
