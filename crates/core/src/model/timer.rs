use chrono::{DateTime, Duration, Utc};

use crate::time::format_hms;

/// Wall-clock start of the current session.
///
/// Only the start instant is persisted, so elapsed time survives restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    started_at: DateTime<Utc>,
}

impl TimerState {
    #[must_use]
    pub fn started_at(at: DateTime<Utc>) -> Self {
        Self { started_at: at }
    }

    /// Rehydrate from epoch milliseconds; `None` if out of range.
    #[must_use]
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_millis(millis).map(Self::started_at)
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn start_epoch_millis(&self) -> i64 {
        self.started_at.timestamp_millis()
    }

    /// Time since start, clamped at zero if the clock went backwards.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.started_at).max(Duration::zero())
    }

    /// Elapsed time as `HH:MM:SS`.
    #[must_use]
    pub fn format_elapsed(&self, now: DateTime<Utc>) -> String {
        format_hms(self.elapsed(now))
    }
}
