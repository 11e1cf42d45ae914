use crate::{beancounters, state};

/// Failure of a check, naming the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read beancounters: {0}")]
    Snapshot(#[from] beancounters::Error),
    #[error("failed to access baseline: {0}")]
    State(#[from] state::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
