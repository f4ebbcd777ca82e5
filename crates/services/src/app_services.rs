use std::sync::Arc;

use rand::Rng;

use storage::repository::Storage;
use storage::session_store::SessionStore;

use crate::Clock;
use crate::corpus::{BankLoad, CorpusSource, load_bank};
use crate::error::{AppServicesError, SessionError};
use crate::sessions::QuizSession;

/// Result of loading the bank and opening a session on it.
#[derive(Debug)]
pub enum QuizLaunch<R> {
    Ready(QuizSession<R>),
    /// The corpus could not be fetched; terminal, no retry.
    LoadFailed(String),
}

/// Assembles storage, clock, and corpus loading for the front end.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    clock: Clock,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self { storage, clock })
    }

    /// Build services backed by process memory only.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self {
            storage: Storage::in_memory(),
            clock,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(Arc::clone(&self.storage.kv))
    }

    /// Load the bank once and open a session on it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persisted state cannot be read or written.
    pub async fn open_quiz<R: Rng>(
        &self,
        source: &dyn CorpusSource,
        selection_rng: R,
        shuffle_rng: R,
    ) -> Result<QuizLaunch<R>, SessionError> {
        let bank = match load_bank(source).await {
            BankLoad::Loaded(bank) => bank,
            BankLoad::Failed(reason) => return Ok(QuizLaunch::LoadFailed(reason)),
            BankLoad::Loading => {
                return Ok(QuizLaunch::LoadFailed("question bank did not finish loading".into()));
            }
        };
        let session = QuizSession::open(
            bank,
            self.session_store(),
            self.clock,
            selection_rng,
            shuffle_rng,
        )
        .await?;
        Ok(QuizLaunch::Ready(session))
    }
}
