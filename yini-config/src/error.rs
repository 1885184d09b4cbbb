//! Façade-level error taxonomy (spec.md §7): wraps each stage's typed error
//! via `#[from]`, the way a single `anyhow::Error` would, but stays typed so
//! `Document::diagnostics` can report kinds without downcasting.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("include cycle detected at {0} (allow_cycles_in_include is false)")]
    IncludeCycleDisallowed(Utf8PathBuf),

    #[error("{0}")]
    Lex(#[from] yini_syntax::Error),

    #[error("{0}")]
    Load(#[from] yini_runtime::Error),

    #[error("{0}")]
    Sidecar(#[from] yini_sidecar::Error),

    #[error("{0}")]
    Dynamic(#[from] yini_dynamic::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
