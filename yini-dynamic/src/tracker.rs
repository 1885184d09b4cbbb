//! Dynamic Value Tracker (spec.md §4.8): finds every `Dyna(...)` site's exact
//! textual extent by rescanning the source line the Resolver recorded a start
//! position for, and records staged mutations (`set`) as bounded-history
//! `DirtyEntry` records ready for `crate::writeback`.
//!
//! Grounded on `original_source/src/Core/YiniManager.h`'s `DirtyValue`: a
//! current value plus a short undo history, keyed by where it came from.

use std::collections::HashMap;
use std::sync::Arc;

use camino::Utf8PathBuf;
use yini_runtime::resolved::{Origin, ResolvedConfig};
use yini_syntax::Value;

use crate::error::{Error, Result};

const MAX_HISTORY: usize = 5;

/// A `Dyna(...)` site's exact textual extent. `inner_start_column` and
/// `inner_end_column` bracket the single argument between the call's
/// parentheses (not the `Dyna(` / `)` wrapper itself, which write-back never
/// touches — see the comment on `Value`'s `Display` impl).
#[derive(Debug, Clone, PartialEq)]
pub struct SiteOrigin {
    pub file: Arc<Utf8PathBuf>,
    pub line: u32,
    pub inner_start_column: u32,
    pub inner_end_column: u32,
    pub inline_comment: Option<String>,
}

impl SiteOrigin {
    fn append(file: Arc<Utf8PathBuf>) -> Self {
        SiteOrigin {
            file,
            line: 0,
            inner_start_column: 0,
            inner_end_column: 0,
            inline_comment: None,
        }
    }

    /// A zero-origin site (spec.md §4.8: "created in memory with no
    /// corresponding source line... meaning 'append'").
    pub fn is_append(&self) -> bool {
        self.line == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirtyEntry {
    pub section: String,
    pub key: String,
    pub value: Value,
    pub history: Vec<Value>,
}

/// Tracks every dynamic site in one document's root file and any staged
/// mutations against them.
pub struct Tracker {
    root_file: Arc<Utf8PathBuf>,
    sites: HashMap<(String, String), SiteOrigin>,
    dirty: HashMap<(String, String), DirtyEntry>,
}

impl Tracker {
    /// Builds a tracker from a resolved config's recorded `Dyna(...)`
    /// origins, rescanning `root_text` to fill in each site's exact value
    /// span. Dynamic values whose origin lies in an included file (rather
    /// than `root_file`) are skipped: spec.md §4.9 describes write-back as
    /// rewriting "the original root file", not arbitrary includes.
    pub fn new(resolved: &ResolvedConfig, root_file: Arc<Utf8PathBuf>, root_text: &str) -> Self {
        let lines: Vec<&str> = root_text.split('\n').collect();
        let mut sites = HashMap::new();
        for (section_name, section) in resolved.sections.iter() {
            for (key, origin) in section.origins.iter() {
                if origin.file != root_file {
                    continue;
                }
                sites.insert(
                    (section_name.to_string(), key.to_string()),
                    rescan_site(origin, &lines),
                );
            }
        }
        Tracker {
            root_file,
            sites,
            dirty: HashMap::new(),
        }
    }

    pub fn dirty_entries(&self) -> impl Iterator<Item = &DirtyEntry> {
        self.dirty.values()
    }

    pub fn site(&self, section: &str, key: &str) -> Option<&SiteOrigin> {
        self.sites.get(&(section.to_string(), key.to_string()))
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// Stages `new_value` for `section.key` (spec.md §4.8's `set` operation).
    /// A key that exists and isn't `Dynamic` is rejected as `NotDynamic`; a
    /// key that doesn't exist in a section that does is created as `Dynamic`
    /// with a zero/append origin.
    pub fn set_value(
        &mut self,
        resolved: &mut ResolvedConfig,
        section: &str,
        key: &str,
        new_value: Value,
    ) -> Result<()> {
        let section_exists = resolved.sections.contains_key(section);
        let current = resolved.get(section, key).cloned();
        let is_dynamic = current.as_ref().map(Value::is_dynamic).unwrap_or(false);

        if current.is_some() && !is_dynamic {
            return Err(Error::NotDynamic(format!("{section}.{key}")));
        }
        if current.is_none() && !section_exists {
            return Err(Error::NotDynamic(format!("{section}.{key}")));
        }

        let id = (section.to_string(), key.to_string());
        let previous_inner = current.map(|v| v.unwrap_dynamic().clone());

        let root_file = self.root_file.clone();
        self.sites
            .entry(id.clone())
            .or_insert_with(|| SiteOrigin::append(root_file));

        let entry = self.dirty.entry(id).or_insert_with(|| DirtyEntry {
            section: section.to_string(),
            key: key.to_string(),
            value: new_value.clone(),
            history: Vec::new(),
        });
        if let Some(previous) = previous_inner {
            entry.history.push(previous);
            if entry.history.len() > MAX_HISTORY {
                entry.history.remove(0);
            }
        }
        entry.value = new_value.clone();

        resolved
            .ensure_section(section)
            .entries
            .insert(key.to_string(), Value::Dynamic(Box::new(new_value)));
        Ok(())
    }
}

fn rescan_site(origin: &Origin, lines: &[&str]) -> SiteOrigin {
    if origin.is_zero() {
        return SiteOrigin::append(origin.file.clone());
    }
    let line_idx = (origin.line as usize).saturating_sub(1);
    let line_text = lines.get(line_idx).copied().unwrap_or("");
    match find_matching_parens(line_text, origin.rhs_start_column) {
        Some((open, close)) => SiteOrigin {
            file: origin.file.clone(),
            line: origin.line,
            inner_start_column: (open + 2) as u32,
            inner_end_column: (close + 1) as u32,
            inline_comment: scan_trailing_comment(&line_text[close + 1..]),
        },
        None => SiteOrigin {
            file: origin.file.clone(),
            line: origin.line,
            inner_start_column: origin.rhs_start_column,
            inner_end_column: origin.rhs_start_column,
            inline_comment: None,
        },
    }
}

/// Finds the byte offsets of the `(` / matching `)` pair of the call that
/// starts at `start_col` (1-based, pointing at the constructor name's first
/// character), skipping over string literals and counting nested parens so a
/// `Dyna(Coord(1, 2))`-shaped argument still resolves to the outer pair.
fn find_matching_parens(line_text: &str, start_col: u32) -> Option<(usize, usize)> {
    let start_byte = (start_col as usize).saturating_sub(1).min(line_text.len());
    let bytes = line_text.as_bytes();

    let mut i = start_byte;
    let mut in_string = false;
    let mut escape = false;
    let mut open = None;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == '(' {
            open = Some(i);
            break;
        }
        i += 1;
    }
    let open = open?;

    let mut depth = 1;
    let mut j = open + 1;
    in_string = false;
    escape = false;
    while j < bytes.len() {
        let c = bytes[j] as char;
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((open, j));
                    }
                }
                _ => {}
            }
        }
        j += 1;
    }
    None
}

fn scan_trailing_comment(rest: &str) -> Option<String> {
    let idx = rest.find("//").into_iter().chain(rest.find("/*")).min()?;
    Some(rest[idx..].trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn rescans_inner_span_excluding_dyna_wrapper() {
        let loaded = yini_runtime::load_from_text_and_resolve(
            "[Settings]\nvolume = Dyna(100) // master\n",
            "t.yini",
            &no_env,
        )
        .expect("resolves");
        let root_file = Arc::new(Utf8PathBuf::from("t.yini"));
        let tracker = Tracker::new(&loaded.resolved, root_file, "[Settings]\nvolume = Dyna(100) // master\n");

        let site = tracker.site("Settings", "volume").expect("tracked");
        assert_eq!(site.line, 2);
        assert_eq!(site.inline_comment.as_deref(), Some("// master"));

        let line = "volume = Dyna(100) // master";
        let start = (site.inner_start_column as usize) - 1;
        let end = (site.inner_end_column as usize) - 1;
        assert_eq!(&line[start..end], "100");
    }

    #[test]
    fn set_value_rejects_non_dynamic_key() {
        let loaded =
            yini_runtime::load_from_text_and_resolve("[Settings]\nbrightness = 5\n", "t2.yini", &no_env)
                .expect("resolves");
        let root_file = Arc::new(Utf8PathBuf::from("t2.yini"));
        let mut tracker = Tracker::new(&loaded.resolved, root_file, "[Settings]\nbrightness = 5\n");
        let mut resolved = loaded.resolved;

        let err = tracker
            .set_value(&mut resolved, "Settings", "brightness", Value::Integer(1))
            .unwrap_err();
        assert!(matches!(err, Error::NotDynamic(_)));
    }

    #[test]
    fn set_value_on_missing_key_in_missing_section_is_rejected() {
        let loaded = yini_runtime::load_from_text_and_resolve("[Settings]\n", "t3.yini", &no_env).expect("resolves");
        let root_file = Arc::new(Utf8PathBuf::from("t3.yini"));
        let mut tracker = Tracker::new(&loaded.resolved, root_file, "[Settings]\n");
        let mut resolved = loaded.resolved;

        let err = tracker
            .set_value(&mut resolved, "Nope", "x", Value::Integer(1))
            .unwrap_err();
        assert!(matches!(err, Error::NotDynamic(_)));
    }

    #[test]
    fn set_value_bounds_history_to_five() {
        let loaded =
            yini_runtime::load_from_text_and_resolve("[A]\nv = Dyna(0)\n", "t4.yini", &no_env).expect("resolves");
        let root_file = Arc::new(Utf8PathBuf::from("t4.yini"));
        let mut tracker = Tracker::new(&loaded.resolved, root_file, "[A]\nv = Dyna(0)\n");
        let mut resolved = loaded.resolved;

        for i in 1..=7 {
            tracker
                .set_value(&mut resolved, "A", "v", Value::Integer(i))
                .expect("dynamic");
        }

        let entry = tracker.dirty_entries().find(|e| e.key == "v").expect("dirty");
        assert_eq!(entry.value, Value::Integer(7));
        assert_eq!(entry.history.len(), 5);
        assert_eq!(entry.history, vec![2, 3, 4, 5, 6].into_iter().map(Value::Integer).collect::<Vec<_>>());
    }
}
