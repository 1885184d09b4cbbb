//! `ResolvedConfig`: the output of the Resolver/Evaluator (spec.md §3, §4.5).

use std::sync::Arc;

use camino::Utf8PathBuf;
use yini_syntax::Value;

/// A minimal insertion-ordered map. `Value::Map` already needs this shape
/// (`yini_syntax::value`); sections need the same ordering guarantee, so the
/// same small linear-scan structure is reused here rather than reaching for
/// a hashmap that would need to carry a separate order vector alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap { entries: Vec::new() }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Inserts or overwrites by key, preserving the original position on
    /// overwrite (spec.md's merge rule: "later key/value pairs override
    /// earlier ones by key", not append-and-shadow).
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write-back origin for a mutable key (spec.md §3 "DirtyEntry", §4.8). Only
/// the rhs start position is recorded here; `yini-dynamic`'s tracker rescans
/// the source line at tracking time to find the rhs's end (or a trailing
/// comment's start), since that requires the original text, not just the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub file: Arc<Utf8PathBuf>,
    pub line: u32,
    pub rhs_start_column: u32,
}

impl Origin {
    /// The zero origin used for dynamic keys created in memory with no
    /// corresponding source line (spec.md §4.8: "created as `Dynamic` with a
    /// zero origin, meaning 'append'").
    pub fn zero(file: Arc<Utf8PathBuf>) -> Self {
        Origin {
            file,
            line: 0,
            rhs_start_column: 0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.line == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSection {
    pub entries: OrderedMap<Value>,
    pub origins: OrderedMap<Origin>,
}

impl ResolvedSection {
    pub fn new() -> Self {
        ResolvedSection::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    pub sections: OrderedMap<ResolvedSection>,
    pub macros: OrderedMap<Value>,
}

impl ResolvedConfig {
    pub fn new() -> Self {
        ResolvedConfig::default()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.sections.get(section)?.entries.get(key)
    }

    /// `get` with the `Dynamic` wrapper stripped, matching the façade's
    /// `get` operation (spec.md §6).
    pub fn get_unwrapped(&self, section: &str, key: &str) -> Option<&Value> {
        self.get(section, key).map(Value::unwrap_dynamic)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut ResolvedSection> {
        self.sections.get_mut(name)
    }

    pub fn ensure_section(&mut self, name: &str) -> &mut ResolvedSection {
        if !self.sections.contains_key(name) {
            self.sections.insert(name.to_string(), ResolvedSection::new());
        }
        self.sections.get_mut(name).expect("just inserted")
    }
}
