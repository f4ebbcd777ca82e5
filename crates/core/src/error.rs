use thiserror::Error;

use crate::model::{ProgressError, StatsError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Stats(#[from] StatsError),
}
