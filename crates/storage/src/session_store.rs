//! Typed persistence for the quiz session on top of a [`KeyValueStore`].
//!
//! Three independent entries are kept: session progress, answer stats, and the
//! timer start. Keys carry a schema version so an incompatible layout starts
//! fresh instead of failing to decode. Entries that are present but do not
//! decode into a valid domain value are treated as absent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use quiz_core::model::{QuestionId, QuestionProgress, SessionState, Stats, TimerState};

use crate::repository::{KeyValueStore, StorageError};

pub const SESSION_KEY: &str = "quiz.session.v1";
pub const STATS_KEY: &str = "quiz.stats.v1";
pub const TIMER_START_KEY: &str = "quiz.timer_start.v1";

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Persisted shape of one progress entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub question_id: u64,
    pub consecutive_correct: u8,
    pub is_excluded: bool,
}

/// Persisted shape of the session state.
///
/// This mirrors the domain `SessionState` so the store can serialize it
/// without leaking storage concerns into the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStateRecord {
    pub progress: Vec<ProgressRecord>,
    pub current_question_id: Option<u64>,
    #[serde(default)]
    pub current_answered: bool,
}

impl SessionStateRecord {
    #[must_use]
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            progress: state
                .progress
                .values()
                .map(|p| ProgressRecord {
                    question_id: p.question_id().value(),
                    consecutive_correct: p.consecutive_correct(),
                    is_excluded: p.is_excluded(),
                })
                .collect(),
            current_question_id: state.current_question_id.map(|id| id.value()),
            current_answered: state.current_answered,
        }
    }

    /// Convert the record back into a domain `SessionState`.
    ///
    /// # Errors
    ///
    /// Returns `quiz_core::Error` if any progress entry violates the mastery invariants.
    pub fn into_state(self) -> Result<SessionState, quiz_core::Error> {
        let mut state = SessionState::default();
        for record in self.progress {
            let id = QuestionId::new(record.question_id);
            let progress =
                QuestionProgress::from_persisted(id, record.consecutive_correct, record.is_excluded)?;
            state.progress.entry(id).or_insert(progress);
        }
        state.current_question_id = self.current_question_id.map(QuestionId::new);
        state.current_answered = state.current_question_id.is_some() && self.current_answered;
        Ok(state)
    }
}

/// Persisted shape of the answer stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub total_answers: u32,
    pub correct_answers: u32,
}

impl StatsRecord {
    #[must_use]
    pub fn from_stats(stats: &Stats) -> Self {
        Self {
            total_answers: stats.total_answers(),
            correct_answers: stats.correct_answers(),
        }
    }

    /// Convert the record back into domain `Stats`.
    ///
    /// # Errors
    ///
    /// Returns `quiz_core::Error` if correct answers exceed the total.
    pub fn into_stats(self) -> Result<Stats, quiz_core::Error> {
        Ok(Stats::from_persisted(
            self.total_answers,
            self.correct_answers,
        )?)
    }
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Reads and writes the three session entries.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the persisted session state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backend fails; corrupt entries load as `None`.
    pub async fn load_session(&self) -> Result<Option<SessionState>, StorageError> {
        let Some(raw) = self.kv.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        let decoded = serde_json::from_str::<SessionStateRecord>(&raw)
            .map_err(|err| err.to_string())
            .and_then(|record| record.into_state().map_err(|err| err.to_string()));
        match decoded {
            Ok(state) => {
                debug!(entries = state.progress.len(), "loaded session state");
                Ok(Some(state))
            }
            Err(reason) => {
                warn!(key = SESSION_KEY, %reason, "discarding unreadable session state");
                Ok(None)
            }
        }
    }

    /// Persist the session state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the backend write fails.
    pub async fn save_session(&self, state: &SessionState) -> Result<(), StorageError> {
        let json = serde_json::to_string(&SessionStateRecord::from_state(state))
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(SESSION_KEY, &json).await
    }

    /// Load the persisted answer stats.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backend fails; corrupt entries load as `None`.
    pub async fn load_stats(&self) -> Result<Option<Stats>, StorageError> {
        let Some(raw) = self.kv.get(STATS_KEY).await? else {
            return Ok(None);
        };
        let decoded = serde_json::from_str::<StatsRecord>(&raw)
            .map_err(|err| err.to_string())
            .and_then(|record| record.into_stats().map_err(|err| err.to_string()));
        match decoded {
            Ok(stats) => Ok(Some(stats)),
            Err(reason) => {
                warn!(key = STATS_KEY, %reason, "discarding unreadable stats");
                Ok(None)
            }
        }
    }

    /// Persist the answer stats.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the backend write fails.
    pub async fn save_stats(&self, stats: &Stats) -> Result<(), StorageError> {
        let json = serde_json::to_string(&StatsRecord::from_stats(stats))
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(STATS_KEY, &json).await
    }

    /// Load the timer start instant.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backend fails; corrupt entries load as `None`.
    pub async fn load_timer(&self) -> Result<Option<TimerState>, StorageError> {
        let Some(raw) = self.kv.get(TIMER_START_KEY).await? else {
            return Ok(None);
        };
        let timer = raw
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(TimerState::from_epoch_millis);
        if timer.is_none() {
            warn!(key = TIMER_START_KEY, raw = %raw, "discarding unreadable timer start");
        }
        Ok(timer)
    }

    /// Persist the timer start as epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend write fails.
    pub async fn save_timer(&self, timer: &TimerState) -> Result<(), StorageError> {
        self.kv
            .set(TIMER_START_KEY, &timer.start_epoch_millis().to_string())
            .await
    }

    /// Remove all three entries.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any delete fails.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(SESSION_KEY).await?;
        self.kv.remove(STATS_KEY).await?;
        self.kv.remove(TIMER_START_KEY).await?;
        debug!("cleared persisted session");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use quiz_core::time::fixed_now;

    fn store() -> (InMemoryRepository, SessionStore) {
        let repo = InMemoryRepository::new();
        let store = SessionStore::new(Arc::new(repo.clone()));
        (repo, store)
    }

    fn sample_state() -> SessionState {
        let mut state = SessionState::default();
        for (id, count, excluded) in [(1, 0, false), (2, 3, false), (3, 5, true)] {
            let id = QuestionId::new(id);
            state.progress.insert(
                id,
                QuestionProgress::from_persisted(id, count, excluded).unwrap(),
            );
        }
        state.current_question_id = Some(QuestionId::new(2));
        state.current_answered = true;
        state
    }

    #[tokio::test]
    async fn missing_entries_load_as_none() {
        let (_repo, store) = store();
        assert!(store.load_session().await.unwrap().is_none());
        assert!(store.load_stats().await.unwrap().is_none());
        assert!(store.load_timer().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn persists_all_three_entries() {
        let (repo, store) = store();
        let state = sample_state();
        let mut stats = Stats::new();
        stats.record(true);
        stats.record(false);
        let timer = TimerState::started_at(fixed_now());

        store.save_session(&state).await.unwrap();
        store.save_stats(&stats).await.unwrap();
        store.save_timer(&timer).await.unwrap();

        assert_eq!(store.load_session().await.unwrap(), Some(state));
        assert_eq!(store.load_stats().await.unwrap(), Some(stats));
        assert_eq!(store.load_timer().await.unwrap(), Some(timer));
        assert_eq!(
            repo.get(TIMER_START_KEY).await.unwrap().as_deref(),
            Some("1700000000000")
        );
    }

    #[tokio::test]
    async fn corrupt_entries_are_treated_as_absent() {
        let (repo, store) = store();
        repo.set(SESSION_KEY, "{not json").await.unwrap();
        repo.set(STATS_KEY, r#"{"total_answers":1,"correct_answers":4}"#)
            .await
            .unwrap();
        repo.set(TIMER_START_KEY, "yesterday").await.unwrap();

        assert!(store.load_session().await.unwrap().is_none());
        assert!(store.load_stats().await.unwrap().is_none());
        assert!(store.load_timer().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn session_violating_mastery_invariant_is_discarded() {
        let (repo, store) = store();
        let raw = r#"{"progress":[{"question_id":1,"consecutive_correct":5,"is_excluded":false}],"current_question_id":null}"#;
        repo.set(SESSION_KEY, raw).await.unwrap();
        assert!(store.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn record_without_answered_latch_defaults_to_false() {
        let (repo, store) = store();
        let raw = r#"{"progress":[{"question_id":4,"consecutive_correct":1,"is_excluded":false}],"current_question_id":4}"#;
        repo.set(SESSION_KEY, raw).await.unwrap();
        let state = store.load_session().await.unwrap().unwrap();
        assert_eq!(state.current_question_id, Some(QuestionId::new(4)));
        assert!(!state.current_answered);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let (repo, store) = store();
        store.save_session(&sample_state()).await.unwrap();
        store.save_stats(&Stats::new()).await.unwrap();
        store
            .save_timer(&TimerState::started_at(fixed_now()))
            .await
            .unwrap();
        assert_eq!(repo.len().unwrap(), 3);

        store.clear().await.unwrap();
        assert_eq!(repo.len().unwrap(), 0);
    }
}
