//! Persist-kind errors for dynamic-value tracking and write-back (spec.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} is not a dynamic value")]
    NotDynamic(String),

    #[error("failed to write back changes: {0}")]
    WriteBackFailed(String),

    #[error("i/o error during write-back: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
