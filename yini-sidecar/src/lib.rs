//! Binary sidecar format: compact serialization of a resolved configuration
//! plus dynamic-value history, used both as a parse cache and as a
//! persistence store (spec.md §4.7). Component I of the pipeline.

pub mod decode;
pub mod encode;
pub mod error;
pub mod format;
pub mod freshness;
#[cfg(test)]
mod tests;
mod value_codec;

use yini_syntax::Value;

pub use decode::{DecodedSection, DecodedSidecar};
pub use error::{Error, Result};

/// One dynamic key's persisted state: its current value and bounded undo
/// history (spec.md §4.8, "pushing a new history value evicts the oldest
/// once the history exceeds five" — the bound is `yini-dynamic`'s to keep;
/// this type just carries whatever it is given).
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicEntry {
    pub section: String,
    pub key: String,
    pub current: Value,
    pub history: Vec<Value>,
}
