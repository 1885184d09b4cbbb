//! Sidecar deserialization (spec.md §4.7).

use std::io::Read;

use scroll::{IOread, LE};
use yini_syntax::Value;

use crate::error::Error;
use crate::format::*;
use crate::value_codec::{read_string, read_value};
use crate::{DynamicEntry, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSection {
    pub name: String,
    pub parents: Vec<String>,
    pub entries: Vec<(String, Value)>,
    pub quick_registers: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSidecar {
    pub version: u8,
    pub defines: Vec<(String, Value)>,
    pub includes: Vec<String>,
    pub sections: Vec<DecodedSection>,
    pub dynamic_state: Vec<DynamicEntry>,
}

/// Reads the four-byte magic and version without decoding the rest — used
/// by [`crate::freshness`] to reject a stale sidecar cheaply.
pub fn peek_version(bytes: &[u8]) -> Result<u8> {
    let mut r = bytes;
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).map_err(|_| Error::Malformed("too short for a header".into()))?;
    if magic != MAGIC {
        return Err(Error::BadMagic);
    }
    let version: u8 = r.ioread()?;
    Ok(version)
}

pub fn decode(bytes: &[u8]) -> Result<DecodedSidecar> {
    let mut r = bytes;

    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).map_err(|_| Error::Malformed("too short for a header".into()))?;
    if magic != MAGIC {
        return Err(Error::BadMagic);
    }
    let version: u8 = r.ioread()?;
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version, VERSION));
    }

    expect_tag(&mut r, TAG_START_OF_FILE)?;

    expect_tag(&mut r, TAG_DEFINES)?;
    let define_count: u32 = r.ioread_with(LE)?;
    let mut defines = Vec::with_capacity(define_count as usize);
    for _ in 0..define_count {
        let name = read_string(&mut r)?;
        let value = read_value(&mut r)?;
        defines.push((name, value));
    }

    expect_tag(&mut r, TAG_INCLUDES)?;
    let include_count: u32 = r.ioread_with(LE)?;
    let mut includes = Vec::with_capacity(include_count as usize);
    for _ in 0..include_count {
        includes.push(read_string(&mut r)?);
    }

    expect_tag(&mut r, TAG_SECTIONS)?;
    let section_count: u32 = r.ioread_with(LE)?;
    let mut sections = Vec::with_capacity(section_count as usize);
    for _ in 0..section_count {
        expect_tag(&mut r, TAG_SECTION_START)?;
        let name = read_string(&mut r)?;

        let parent_count: u32 = r.ioread_with(LE)?;
        let mut parents = Vec::with_capacity(parent_count as usize);
        for _ in 0..parent_count {
            parents.push(read_string(&mut r)?);
        }

        let entry_count: u32 = r.ioread_with(LE)?;
        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let key = read_string(&mut r)?;
            let value = read_value(&mut r)?;
            entries.push((key, value));
        }

        let quick_register_count: u32 = r.ioread_with(LE)?;
        let mut quick_registers = Vec::with_capacity(quick_register_count as usize);
        for _ in 0..quick_register_count {
            quick_registers.push(read_value(&mut r)?);
        }

        sections.push(DecodedSection {
            name,
            parents,
            entries,
            quick_registers,
        });
    }

    expect_tag(&mut r, TAG_DYNAMIC_STATE)?;
    let dynamic_count: u32 = r.ioread_with(LE)?;
    let mut dynamic_state = Vec::with_capacity(dynamic_count as usize);
    for _ in 0..dynamic_count {
        let section = read_string(&mut r)?;
        let key = read_string(&mut r)?;
        let current = read_value(&mut r)?;
        let history_count: u32 = r.ioread_with(LE)?;
        let mut history = Vec::with_capacity(history_count as usize);
        for _ in 0..history_count {
            history.push(read_value(&mut r)?);
        }
        dynamic_state.push(DynamicEntry {
            section,
            key,
            current,
            history,
        });
    }

    expect_tag(&mut r, TAG_END_OF_FILE)?;

    Ok(DecodedSidecar {
        version,
        defines,
        includes,
        sections,
        dynamic_state,
    })
}

fn expect_tag(r: &mut impl Read, expected: u8) -> Result<()> {
    let found: u8 = r.ioread()?;
    if found != expected {
        return Err(Error::Malformed(format!(
            "expected structural tag {expected:#x}, found {found:#x}"
        )));
    }
    Ok(())
}
