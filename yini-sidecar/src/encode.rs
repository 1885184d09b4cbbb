//! Sidecar serialization (spec.md §4.7).

use std::collections::HashMap;
use std::io::Write;

use scroll::{IOwrite, LE};
use yini_runtime::resolved::ResolvedConfig;
use yini_syntax::ast::Document;

use crate::error::Result;
use crate::format::*;
use crate::value_codec::{write_string, write_value};
use crate::DynamicEntry;

/// Serializes a resolved configuration plus dynamic-value state into the
/// sidecar's compact binary form. `document` supplies section parent lists
/// (already flattened away by the time `resolved` is built) and the
/// informational include-path list; the sections' actual values come from
/// `resolved`.
pub fn encode(document: &Document, resolved: &ResolvedConfig, dynamic_state: &[DynamicEntry]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();

    buf.write_all(&MAGIC)?;
    buf.iowrite(VERSION)?;
    buf.iowrite(TAG_START_OF_FILE)?;

    buf.iowrite(TAG_DEFINES)?;
    buf.iowrite_with(resolved.macros.len() as u32, LE)?;
    for (name, value) in resolved.macros.iter() {
        write_string(&mut buf, name)?;
        write_value(&mut buf, value)?;
    }

    buf.iowrite(TAG_INCLUDES)?;
    buf.iowrite_with(document.includes.len() as u32, LE)?;
    for include in &document.includes {
        let canonical = yini_syntax::reader::canonicalize(camino::Utf8Path::new(&include.path));
        write_string(&mut buf, canonical.as_str())?;
    }

    let parents_by_name: HashMap<&str, &[String]> = document
        .sections
        .iter()
        .map(|s| (s.name.as_str(), s.parents.as_slice()))
        .collect();

    buf.iowrite(TAG_SECTIONS)?;
    buf.iowrite_with(resolved.sections.len() as u32, LE)?;
    for (name, section) in resolved.sections.iter() {
        buf.iowrite(TAG_SECTION_START)?;
        write_string(&mut buf, name)?;

        let parents = parents_by_name.get(name).copied().unwrap_or_default();
        buf.iowrite_with(parents.len() as u32, LE)?;
        for parent in parents {
            write_string(&mut buf, parent)?;
        }

        buf.iowrite_with(section.entries.len() as u32, LE)?;
        for (key, value) in section.entries.iter() {
            write_string(&mut buf, key)?;
            write_value(&mut buf, value)?;
        }

        // Quick-register values are folded into `entries` by the Resolver
        // (keyed by their stringified auto-index) and are no longer
        // distinguishable from an ordinary integer-named key once resolved;
        // this list is always empty on encode (see DESIGN.md).
        buf.iowrite_with(0u32, LE)?;
    }

    buf.iowrite(TAG_DYNAMIC_STATE)?;
    buf.iowrite_with(dynamic_state.len() as u32, LE)?;
    for entry in dynamic_state {
        write_string(&mut buf, &entry.section)?;
        write_string(&mut buf, &entry.key)?;
        write_value(&mut buf, &entry.current)?;
        buf.iowrite_with(entry.history.len() as u32, LE)?;
        for value in &entry.history {
            write_value(&mut buf, value)?;
        }
    }

    buf.iowrite(TAG_END_OF_FILE)?;

    Ok(buf)
}
