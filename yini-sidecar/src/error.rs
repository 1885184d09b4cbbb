//! Persist-kind errors for the binary sidecar (spec.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("value is not fully resolved and cannot be serialized: {0}")]
    UnresolvedValue(String),

    #[error("bad magic number, not a YINI sidecar")]
    BadMagic,

    #[error("unsupported sidecar version {0}, expected {1}")]
    UnsupportedVersion(u8, u8),

    #[error("truncated or malformed sidecar: {0}")]
    Malformed(String),

    #[error("i/o error reading sidecar: {0}")]
    Io(#[from] std::io::Error),

    #[error("binary codec error: {0}")]
    Codec(#[from] scroll::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
