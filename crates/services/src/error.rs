//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while fetching the raw question bank.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CorpusError {
    #[error("failed to read question bank {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("question bank {} is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },
}

/// Errors emitted by session services.
///
/// Caller-contract violations (answering twice, advancing with nothing current)
/// are not errors; they come back as rejected outcomes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
