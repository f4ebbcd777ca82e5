//! Fetching and parsing the raw question bank.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use quiz_core::model::Bank;
use quiz_core::parser;

use crate::error::CorpusError;

/// Where the raw bank text comes from.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Fetch the whole corpus as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns `CorpusError` if the text cannot be read or decoded.
    async fn fetch(&self) -> Result<String, CorpusError>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// Corpus read from a file on disk.
#[derive(Debug, Clone)]
pub struct FileCorpus {
    path: PathBuf,
}

impl FileCorpus {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CorpusSource for FileCorpus {
    async fn fetch(&self) -> Result<String, CorpusError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| CorpusError::Io {
                path: self.path.clone(),
                source,
            })?;
        String::from_utf8(bytes).map_err(|_| CorpusError::Encoding {
            path: self.path.clone(),
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Corpus held in memory.
#[derive(Debug, Clone)]
pub struct StaticCorpus(String);

impl StaticCorpus {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

#[async_trait]
impl CorpusSource for StaticCorpus {
    async fn fetch(&self) -> Result<String, CorpusError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("<memory:{} bytes>", self.0.len())
    }
}

/// Where the bank is in its one-time load.
///
/// Session operations are only available once the bank is `Loaded`; a failed
/// fetch is terminal and not retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankLoad {
    Loading,
    Loaded(Bank),
    Failed(String),
}

impl BankLoad {
    #[must_use]
    pub fn bank(&self) -> Option<&Bank> {
        match self {
            BankLoad::Loaded(bank) => Some(bank),
            BankLoad::Loading | BankLoad::Failed(_) => None,
        }
    }
}

/// Fetch and parse the bank once.
///
/// Malformed blocks are dropped silently; an empty bank is a valid result.
pub async fn load_bank(source: &dyn CorpusSource) -> BankLoad {
    let origin = source.describe();
    let raw = match source.fetch().await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(%origin, error = %err, "question bank could not be loaded");
            return BankLoad::Failed(err.to_string());
        }
    };

    let report = parser::parse_report(&raw);
    debug!(
        %origin,
        blocks = report.blocks,
        skipped = report.skipped,
        duplicates = report.duplicates,
        "parsed question bank"
    );
    let bank = Bank::from_questions(report.questions);
    info!(%origin, questions = bank.len(), "question bank loaded");
    BankLoad::Loaded(bank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("quiz-{name}-{}-{nanos}.txt", std::process::id()))
    }

    #[tokio::test]
    async fn static_corpus_loads_bank() {
        let source = StaticCorpus::new("1. Q?\n*a\nb\nc\n");
        let load = load_bank(&source).await;
        assert_eq!(load.bank().map(Bank::len), Some(1));
    }

    #[tokio::test]
    async fn unparseable_corpus_is_an_empty_bank_not_a_failure() {
        let source = StaticCorpus::new("nothing here");
        let load = load_bank(&source).await;
        assert_eq!(load, BankLoad::Loaded(Bank::default()));
    }

    #[tokio::test]
    async fn missing_file_is_a_load_failure() {
        let source = FileCorpus::new(temp_path("missing"));
        let load = load_bank(&source).await;
        assert!(matches!(load, BankLoad::Failed(_)));
        assert!(load.bank().is_none());
    }

    #[tokio::test]
    async fn file_corpus_reads_utf8_and_rejects_other_bytes() {
        let path = temp_path("utf8");
        tokio::fs::write(&path, "3. Вопрос?\n*да\nнет\nможет быть\n")
            .await
            .unwrap();
        let load = load_bank(&FileCorpus::new(&path)).await;
        let bank = load.bank().unwrap();
        assert_eq!(bank.questions()[0].text(), "Вопрос?");

        tokio::fs::write(&path, [0xff_u8, 0xfe, 0x00]).await.unwrap();
        let err = FileCorpus::new(&path).fetch().await.unwrap_err();
        assert!(matches!(err, CorpusError::Encoding { .. }));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
