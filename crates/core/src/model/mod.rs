mod ids;
mod progress;
mod question;
mod stats;
mod timer;

pub use ids::QuestionId;
pub use progress::{
    MASTERY_THRESHOLD, ProgressChange, ProgressError, ProgressMap, QuestionProgress, SessionState,
};
pub use question::{AnswerOption, Bank, OPTIONS_PER_QUESTION, Question};
pub use stats::{Stats, StatsError, round_percent};
pub use timer::TimerState;
