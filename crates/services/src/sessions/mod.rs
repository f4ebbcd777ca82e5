mod auto_advance;
pub mod engine;
mod presentation;
mod progress;
mod service;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use auto_advance::{AutoAdvance, DEFAULT_AUTO_ADVANCE_DELAY};
pub use engine::{AnswerOutcome, AnswerRecord, Rejection, Selection};
pub use presentation::{Presentation, PresentationToken};
pub use progress::SessionProgress;
pub use service::QuizSession;
