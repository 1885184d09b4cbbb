//! The Document Façade (spec.md §6, §4.10): the one public entry point that
//! orchestrates Loader → Resolver → Validator (`yini-runtime`), the Dynamic
//! Value Tracker and write-back (`yini-dynamic`), and exposes read/mutate/
//! persist operations over the result.
//!
//! Grounded on `diskplan_config::Config`'s role as the single owning struct
//! that wraps an options bag plus the loaded/resolved state and exposes
//! `load`/query methods over it.
//!
//! A `Document` is meant for single-threaded, one-document-at-a-time use:
//! `set`/`save` take `&mut self`, and nothing here is `Sync`.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use yini_runtime::resolved::ResolvedConfig;
use yini_syntax::ast::SchemaRule;
use yini_syntax::Value;

use crate::error::{Error, Result};
use crate::options::Options;

/// One accumulated diagnostic from any stage, surfaced uniformly via
/// `diagnostics()` (spec.md §7: "the façade surface distinguishes fatal
/// errors... from diagnostic errors, retrieved via `diagnostics()`").
#[derive(Debug, Clone)]
pub enum Diagnostic {
    Load(yini_runtime::Warning),
    Resolve(yini_runtime::Error),
    Validate(yini_runtime::ValidationError),
}

pub struct Document {
    options: Options,
    root_file: Arc<Utf8PathBuf>,
    source_text: Arc<str>,
    ast: yini_syntax::ast::Document,
    resolved: ResolvedConfig,
    diagnostics: Vec<Diagnostic>,
    tracker: yini_dynamic::Tracker,
}

impl Document {
    /// Loads `path` and every file it transitively includes (spec.md §6
    /// `load`).
    pub fn load(path: impl AsRef<Utf8Path>, options: Options) -> Result<Self> {
        let path = path.as_ref().to_owned();
        tracing::trace!("loading document from {}", path);
        let source_text: Arc<str> = std::fs::read_to_string(&path)?.into();
        let loaded = yini_runtime::load_and_resolve(&path, options.max_include_depth, &*options.env_provider)?;
        Self::finish(loaded, Arc::new(path), source_text, options)
    }

    /// Parses in-memory text with no file I/O; any `#include` is left
    /// unresolved (spec.md §6 `load_from_text`).
    pub fn load_from_text(text: &str, virtual_path: impl AsRef<Utf8Path>, options: Options) -> Result<Self> {
        let virtual_path = virtual_path.as_ref().to_owned();
        let loaded = yini_runtime::load_from_text_and_resolve(text, &virtual_path, &*options.env_provider)?;
        Self::finish(loaded, Arc::new(virtual_path), Arc::from(text), options)
    }

    fn finish(
        loaded: yini_runtime::LoadedConfig,
        root_file: Arc<Utf8PathBuf>,
        source_text: Arc<str>,
        options: Options,
    ) -> Result<Self> {
        if !options.allow_cycles_in_include {
            if let Some(yini_runtime::Warning::IncludeCycleResolvedByElision { path }) =
                loaded.load_warnings.first()
            {
                return Err(Error::IncludeCycleDisallowed(path.clone()));
            }
        }

        let tracker = yini_dynamic::Tracker::new(&loaded.resolved, root_file.clone(), &source_text);

        let mut diagnostics = Vec::new();
        diagnostics.extend(loaded.load_warnings.into_iter().map(Diagnostic::Load));
        diagnostics.extend(loaded.resolve_errors.into_iter().map(Diagnostic::Resolve));
        diagnostics.extend(loaded.validation_errors.into_iter().map(Diagnostic::Validate));

        Ok(Document {
            options,
            root_file,
            source_text,
            ast: loaded.document,
            resolved: loaded.resolved,
            diagnostics,
            tracker,
        })
    }

    /// Returns the resolved `Value` for `section.key`, with one level of
    /// `Dynamic` unwrapped (spec.md §6 `get`).
    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.resolved.get_unwrapped(section, key)
    }

    /// Stages `value` for `section.key` (spec.md §6 `set`): fails with
    /// `NotDynamic` unless the key is already dynamic, or the section exists
    /// but the key does not (in which case it is created as dynamic).
    pub fn set(&mut self, section: &str, key: &str, value: Value) -> Result<()> {
        self.tracker.set_value(&mut self.resolved, section, key, value)?;
        Ok(())
    }

    /// Applies every staged `set` to the root file in place, atomically
    /// (spec.md §6 `save`, §4.9).
    pub fn save(&mut self) -> Result<()> {
        let dirty_count = self.tracker.dirty_entries().count();
        tracing::trace!("writing back {} dirty entr{} to {}", dirty_count, if dirty_count == 1 { "y" } else { "ies" }, self.root_file);
        let rewritten = yini_dynamic::writeback::save_to_path(&mut self.tracker, &*self.root_file, &self.source_text)?;
        self.source_text = Arc::from(rewritten);
        Ok(())
    }

    /// The parsed `[#schema]` rules, for tooling (spec.md §6 `schema`).
    pub fn schema(&self) -> &[SchemaRule] {
        &self.ast.schema_rules
    }

    /// A read-only view of the resolved configuration (spec.md §6
    /// `resolved`).
    pub fn resolved(&self) -> &ResolvedConfig {
        &self.resolved
    }

    /// Every dynamic key's current value and undo history, in the shape
    /// `yini-sidecar::encode` expects (spec.md §4.7's `TAG_DYNAMIC_STATE`).
    /// Keys never staged via `set` are reported with an empty history.
    pub fn dynamic_entries(&self) -> Vec<yini_sidecar::DynamicEntry> {
        let mut entries = Vec::new();
        for (section_name, section) in self.resolved.sections.iter() {
            for (key, value) in section.entries.iter() {
                if !value.is_dynamic() {
                    continue;
                }
                let history = self
                    .tracker
                    .dirty_entries()
                    .find(|d| d.section == section_name && d.key == key)
                    .map(|d| d.history.clone())
                    .unwrap_or_default();
                entries.push(yini_sidecar::DynamicEntry {
                    section: section_name.to_string(),
                    key: key.to_string(),
                    current: value.unwrap_dynamic().clone(),
                    history,
                });
            }
        }
        entries
    }

    /// The options this document was loaded with (for the CLI's
    /// `sidecar_path_fn`/`env_provider` use).
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Every diagnostic accumulated during load/resolve/validate (spec.md §6
    /// `diagnostics`); empty does not imply the document is useless, only
    /// that nothing short of a fatal error occurred.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn root_file(&self) -> &Utf8Path {
        &self.root_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn text_options() -> Options {
        Options {
            env_provider: Arc::new(no_env),
            ..Options::default()
        }
    }

    #[test]
    fn get_and_set_work_over_load_from_text() {
        // load_from_text has no real file to persist to; save() round-trips
        // through disk and is exercised in `tests/scenarios.rs` instead.
        let mut doc = Document::load_from_text(
            "[Settings]\nvolume = Dyna(100) // master\n",
            "doc.yini",
            text_options(),
        )
        .expect("loads");
        assert_eq!(doc.get("Settings", "volume"), Some(&Value::Integer(100)));
        doc.set("Settings", "volume", Value::Integer(75)).expect("dynamic");
        assert_eq!(doc.get("Settings", "volume"), Some(&Value::Integer(75)));
    }

    #[test]
    fn set_on_non_dynamic_key_is_rejected() {
        let mut doc = Document::load_from_text("[A]\nx = 1\n", "doc2.yini", text_options()).expect("loads");
        let err = doc.set("A", "x", Value::Integer(2)).unwrap_err();
        assert!(matches!(err, Error::Dynamic(yini_dynamic::Error::NotDynamic(_))));
    }

    #[test]
    fn diagnostics_report_circular_reference() {
        let doc = Document::load_from_text("[X]\na = @{X.b}\n[X]\nb = @{X.a}\n", "doc3.yini", text_options())
            .expect("loads; the cycle is a diagnostic, not a fatal error");
        assert!(doc.diagnostics().iter().any(|d| matches!(
            d,
            Diagnostic::Resolve(yini_runtime::Error::CircularReference(_))
        )));
    }
}
