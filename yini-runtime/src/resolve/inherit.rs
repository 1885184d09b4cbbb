//! Pass 2 — inheritance flattening (spec.md §4.5).

use std::collections::HashMap;

use yini_syntax::ast::{Document, Entry, Expr, Section};
use yini_syntax::ErrorSite;

use crate::error::{Error, Result};
use crate::resolved::OrderedMap;

/// A section after its inheritance chain has been folded in, but before
/// pass 3's expression evaluation runs — entries are still unresolved
/// `Expr` trees.
#[derive(Debug, Clone)]
pub struct FlattenedSection {
    pub name: String,
    /// Keyed entries in final override order: parents (in list order,
    /// later parent wins), then the section's own keys overlaid last.
    pub entries: OrderedMap<Expr>,
    /// Quick-register (`+= value`) statements belong only to the section
    /// that wrote them; they are not inherited.
    pub quick_registers: Vec<Expr>,
}

/// Flattens every section's inheritance chain, returning them in the
/// topological order parents-before-children was computed in (irrelevant to
/// callers beyond determinism, spec.md §8 "Inheritance merge is
/// deterministic").
pub fn flatten_inheritance(document: &Document) -> Result<Vec<FlattenedSection>> {
    let by_name: HashMap<&str, &Section> =
        document.sections.iter().map(|s| (s.name.as_str(), s)).collect();

    let mut flattened: HashMap<String, FlattenedSection> = HashMap::new();
    let mut visiting = Vec::new();

    for section in &document.sections {
        flatten_one(section, &by_name, &mut flattened, &mut visiting)?;
    }

    Ok(document
        .sections
        .iter()
        .map(|s| flattened.remove(&s.name).expect("flattened above"))
        .collect())
}

fn flatten_one<'doc>(
    section: &'doc Section,
    by_name: &HashMap<&'doc str, &'doc Section>,
    flattened: &mut HashMap<String, FlattenedSection>,
    visiting: &mut Vec<String>,
) -> Result<FlattenedSection> {
    if let Some(done) = flattened.get(&section.name) {
        return Ok(done.clone());
    }
    if visiting.contains(&section.name) {
        return Err(Error::CircularInheritance(ErrorSite::named(
            section.position.clone(),
            section.name.clone(),
        )));
    }
    visiting.push(section.name.clone());

    let mut entries: OrderedMap<Expr> = OrderedMap::new();
    for parent_name in &section.parents {
        let parent = by_name.get(parent_name.as_str()).ok_or_else(|| {
            Error::ParentSectionNotFound(ErrorSite::named(
                section.position.clone(),
                parent_name.clone(),
            ))
        })?;
        let parent_flat = flatten_one(parent, by_name, flattened, visiting)?;
        for (key, expr) in parent_flat.entries.iter() {
            entries.insert(key.to_string(), expr.clone());
        }
    }

    let mut quick_registers = Vec::new();
    for entry in &section.entries {
        match entry {
            Entry::KeyValue { key, value, .. } => entries.insert(key.clone(), value.clone()),
            Entry::QuickRegister { value, .. } => quick_registers.push(value.clone()),
        }
    }

    visiting.pop();
    let result = FlattenedSection {
        name: section.name.clone(),
        entries,
        quick_registers,
    };
    flattened.insert(section.name.clone(), result.clone());
    Ok(result)
}
