//! Loading, resolution, and schema validation for YINI documents.
//!
//! Covers components D–F of the pipeline (Loader, Resolver/Evaluator,
//! Schema Validator). Consumes `yini-syntax::Document`; produces a
//! [`resolved::ResolvedConfig`] plus accumulated diagnostics.

pub mod error;
pub mod loader;
pub mod resolve;
pub mod resolved;
#[cfg(test)]
mod tests;
pub mod validate;

use camino::Utf8Path;
use yini_syntax::ast::Document;

pub use error::{Error, Result, ValidationError};
pub use loader::Warning;
pub use resolved::{Origin, ResolvedConfig};

/// Everything produced by processing one root file: the merged AST (kept
/// around for `schema()` and diagnostics), the resolved configuration, and
/// every diagnostic collected along the way.
pub struct LoadedConfig {
    pub document: Document,
    pub resolved: ResolvedConfig,
    pub load_warnings: Vec<Warning>,
    pub resolve_errors: Vec<Error>,
    pub validation_errors: Vec<ValidationError>,
}

/// Runs the full Loader → Resolver → Validator pipeline for a file on disk.
pub fn load_and_resolve(
    root_path: impl AsRef<Utf8Path>,
    max_include_depth: u32,
    env_provider: &dyn Fn(&str) -> Option<String>,
) -> Result<LoadedConfig> {
    let loaded = loader::load(root_path, max_include_depth)?;
    finish(loaded.document, loaded.warnings, env_provider)
}

/// Runs the Loader (text-only) → Resolver → Validator pipeline for in-memory
/// text with no file system access (spec.md §6 `load_from_text`).
pub fn load_from_text_and_resolve(
    text: &str,
    virtual_path: impl AsRef<Utf8Path>,
    env_provider: &dyn Fn(&str) -> Option<String>,
) -> Result<LoadedConfig> {
    let loaded = loader::load_from_text(text, virtual_path)?;
    finish(loaded.document, loaded.warnings, env_provider)
}

fn finish(
    document: Document,
    load_warnings: Vec<Warning>,
    env_provider: &dyn Fn(&str) -> Option<String>,
) -> Result<LoadedConfig> {
    let (mut resolved, resolve_errors) = resolve::resolve(&document, env_provider)?;
    let validation_errors = validate::validate(&mut resolved, &document.schema_rules, env_provider);
    Ok(LoadedConfig {
        document,
        resolved,
        load_warnings,
        resolve_errors,
        validation_errors,
    })
}
