//! Loader: multi-file include resolution and AST merge (spec.md §4.4).
//!
//! Unlike `diskplan_config::cache::SchemaCache`, which keeps every parsed
//! schema around so repeated lookups reuse it, an included file here
//! contributes its content to the merge exactly once: a second include of
//! the same canonical path is idempotent by elision, not by cache reuse
//! (spec.md §3's "file inclusion is idempotent" invariant; §4.4 step 1).

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::trace;
use yini_syntax::ast::{Document, Entry, Section};
use yini_syntax::reader::SourceFile;
use yini_syntax::ErrorSite;

use crate::error::{Error, Result};
use crate::resolved::OrderedMap;

/// Non-fatal diagnostics produced during loading (spec.md §7 "Load").
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    IncludeCycleResolvedByElision { path: Utf8PathBuf },
}

pub struct Loaded {
    pub document: Document,
    pub warnings: Vec<Warning>,
}

/// Loads `root_path` and every file it transitively includes, returning one
/// merged [`Document`] with `#include` discarded (spec.md §4.4 step 5).
pub fn load(root_path: impl AsRef<Utf8Path>, max_include_depth: u32) -> Result<Loaded> {
    let mut visited = HashSet::new();
    let mut warnings = Vec::new();
    let mut document = load_rec(root_path.as_ref(), &mut visited, 0, max_include_depth, &mut warnings)?;
    document.schema_rules = dedup_schema_rules(std::mem::take(&mut document.schema_rules));
    Ok(Loaded { document, warnings })
}

/// Parses in-memory text with no include resolution (spec.md §6
/// `load_from_text`): any `#include` entries are left unresolved and simply
/// contribute nothing, since there is no file system to resolve them
/// against.
pub fn load_from_text(text: &str, virtual_path: impl AsRef<Utf8Path>) -> Result<Loaded> {
    let source = SourceFile::virtual_text(virtual_path, text.to_string());
    let mut document = yini_syntax::parse_source_file(&source)?;
    document.includes.clear();
    document.sections = consolidate_sections(document.sections);
    document.schema_rules = dedup_schema_rules(document.schema_rules);
    Ok(Loaded {
        document,
        warnings: Vec::new(),
    })
}

/// Merges same-named sections appearing more than once within a single
/// parsed document (e.g. `[X] a = 1` followed later by `[X] b = 2`) using the
/// same key-by-key rule as cross-file merging (spec.md §4.4 step 4 applies
/// equally within one file — nothing in §3's "unique section name" invariant
/// forbids repeating a header to add more entries to it).
fn consolidate_sections(sections: Vec<Section>) -> Vec<Section> {
    sections
        .into_iter()
        .fold(Vec::new(), |acc, section| merge_sections(acc, vec![section]))
}

fn load_rec(
    path: &Utf8Path,
    visited: &mut HashSet<Utf8PathBuf>,
    depth: u32,
    max_depth: u32,
    warnings: &mut Vec<Warning>,
) -> Result<Document> {
    let canonical = yini_syntax::reader::canonicalize(path);

    if visited.contains(&canonical) || depth > max_depth {
        trace!(%canonical, "include cycle or depth limit, eliding");
        warnings.push(Warning::IncludeCycleResolvedByElision { path: canonical });
        return Ok(Document::new());
    }
    visited.insert(canonical.clone());

    let source = SourceFile::read(path).map_err(|_| {
        Error::FileNotFound {
            path: path.to_string(),
            site: ErrorSite::named(yini_syntax::Position::synthetic(), path.to_string()),
        }
    })?;
    let mut own_document = yini_syntax::parse_source_file(&source)?;
    own_document.sections = consolidate_sections(own_document.sections);

    let mut accumulator = Document::new();
    let base_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    for include in &own_document.includes {
        let include_path = base_dir.join(&include.path);
        let sub_document = load_rec(&include_path, visited, depth + 1, max_depth, warnings)?;
        accumulator = merge(accumulator, sub_document);
    }
    accumulator = merge(accumulator, own_document);
    accumulator.includes.clear();
    Ok(accumulator)
}

/// Folds `overlay` (processed later — the including file, or a
/// later-listed include) over `base` per spec.md §4.4 step 4.
fn merge(base: Document, overlay: Document) -> Document {
    let mut defines = base.defines;
    defines.extend(overlay.defines);

    let mut includes = base.includes;
    includes.extend(overlay.includes);

    let mut schema_rules = base.schema_rules;
    schema_rules.extend(overlay.schema_rules);

    let sections = merge_sections(base.sections, overlay.sections);

    Document {
        sections,
        defines,
        includes,
        schema_rules,
    }
}

fn merge_sections(base: Vec<Section>, overlay: Vec<Section>) -> Vec<Section> {
    let mut result = base;
    for incoming in overlay {
        if let Some(existing) = result.iter_mut().find(|s| s.name == incoming.name) {
            existing.parents = incoming.parents;
            existing.entries = merge_entries(std::mem::take(&mut existing.entries), incoming.entries);
        } else {
            result.push(incoming);
        }
    }
    result
}

/// Later key/value pairs override earlier ones by key, in place; later
/// quick-register statements always append to the tail (spec.md §4.4 step 4).
fn merge_entries(base: Vec<Entry>, overlay: Vec<Entry>) -> Vec<Entry> {
    let mut result = base;
    for incoming in overlay {
        match &incoming {
            Entry::KeyValue { key, .. } => {
                if let Some(slot) = result.iter_mut().find(
                    |e| matches!(e, Entry::KeyValue { key: existing_key, .. } if existing_key == key),
                ) {
                    *slot = incoming;
                } else {
                    result.push(incoming);
                }
            }
            Entry::QuickRegister { .. } => result.push(incoming),
        }
    }
    result
}

fn dedup_schema_rules(rules: Vec<yini_syntax::ast::SchemaRule>) -> Vec<yini_syntax::ast::SchemaRule> {
    let mut by_target: OrderedMap<yini_syntax::ast::SchemaRule> = OrderedMap::new();
    for rule in rules {
        let target = format!("{}.{}", rule.section, rule.key);
        by_target.insert(target, rule);
    }
    by_target.iter().map(|(_, rule)| rule.clone()).collect()
}
