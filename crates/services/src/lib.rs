#![forbid(unsafe_code)]

pub mod app_services;
pub mod corpus;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::{AppServices, QuizLaunch};
pub use corpus::{BankLoad, CorpusSource, FileCorpus, StaticCorpus, load_bank};
pub use error::{AppServicesError, CorpusError, SessionError};

pub use sessions::{
    AnswerOutcome, AnswerRecord, AutoAdvance, DEFAULT_AUTO_ADVANCE_DELAY, Presentation,
    PresentationToken, QuizSession, Rejection, Selection, SessionProgress,
};
