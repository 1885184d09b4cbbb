//! The Document Façade (spec.md §4.10, §6): the single public entry point
//! over the whole YINI pipeline — Source Reader/Lexer/Parser (`yini-syntax`),
//! Loader/Resolver/Validator (`yini-runtime`), Binary Sidecar
//! (`yini-sidecar`), and Dynamic Value Tracker/Write-Back (`yini-dynamic`).

pub mod document;
pub mod error;
pub mod options;

pub use document::{Diagnostic, Document};
pub use error::{Error, Result};
pub use options::Options;
