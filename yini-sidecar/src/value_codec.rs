//! Shared `Value` <-> bytes codec (spec.md §4.7 "Value encoding"), used by
//! both [`crate::encode`] and [`crate::decode`].

use std::io::{Read, Write};

use scroll::{IOread, IOwrite, LE};
use yini_syntax::value::{Color, Coord, PathValue};
use yini_syntax::Value;

use crate::error::{Error, Result};
use crate::format::*;

pub(crate) fn write_string(w: &mut impl Write, s: &str) -> Result<()> {
    w.iowrite_with(s.len() as u32, LE)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

pub(crate) fn read_string(r: &mut impl Read) -> Result<String> {
    let len: u32 = r.ioread_with(LE)?;
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::Malformed(format!("string is not utf-8: {e}")))
}

pub(crate) fn write_value(w: &mut impl Write, value: &Value) -> Result<()> {
    match value {
        Value::Null => w.iowrite(VALUE_NULL)?,
        Value::Boolean(b) => {
            w.iowrite(VALUE_BOOL)?;
            w.iowrite(*b as u8)?;
        }
        Value::Integer(i) => {
            w.iowrite(VALUE_INT64)?;
            w.iowrite_with(*i, LE)?;
        }
        Value::Float(f) => {
            w.iowrite(VALUE_FLOAT64)?;
            w.iowrite_with(*f, LE)?;
        }
        Value::String(s) => {
            w.iowrite(VALUE_STRING)?;
            write_string(w, s)?;
        }
        Value::Array(items) => {
            w.iowrite(VALUE_ARRAY)?;
            write_value_seq(w, items)?;
        }
        Value::Set(items) => {
            w.iowrite(VALUE_SET)?;
            write_value_seq(w, items)?;
        }
        Value::Map(entries) => {
            w.iowrite(VALUE_MAP)?;
            w.iowrite_with(entries.len() as u32, LE)?;
            for (k, v) in entries {
                write_string(w, k)?;
                write_value(w, v)?;
            }
        }
        Value::Color(c) => {
            w.iowrite(VALUE_COLOR)?;
            w.iowrite(c.r)?;
            w.iowrite(c.g)?;
            w.iowrite(c.b)?;
            write_option_u8(w, c.a)?;
        }
        Value::Coord(c) => {
            w.iowrite(VALUE_COORD)?;
            w.iowrite_with(c.x, LE)?;
            w.iowrite_with(c.y, LE)?;
            write_option_f64(w, c.z)?;
        }
        Value::Path(p) => {
            w.iowrite(VALUE_PATH)?;
            write_string(w, &p.text)?;
        }
        Value::Dynamic(inner) => {
            w.iowrite(VALUE_DYNAMIC)?;
            write_value(w, inner)?;
        }
    }
    Ok(())
}

fn write_value_seq(w: &mut impl Write, items: &[Value]) -> Result<()> {
    w.iowrite_with(items.len() as u32, LE)?;
    for item in items {
        write_value(w, item)?;
    }
    Ok(())
}

fn write_option_u8(w: &mut impl Write, value: Option<u8>) -> Result<()> {
    match value {
        Some(v) => {
            w.iowrite(1u8)?;
            w.iowrite(v)?;
        }
        None => w.iowrite(0u8)?,
    }
    Ok(())
}

fn write_option_f64(w: &mut impl Write, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) => {
            w.iowrite(1u8)?;
            w.iowrite_with(v, LE)?;
        }
        None => w.iowrite(0u8)?,
    }
    Ok(())
}

pub(crate) fn read_value(r: &mut impl Read) -> Result<Value> {
    let tag: u8 = r.ioread()?;
    Ok(match tag {
        VALUE_NULL => Value::Null,
        VALUE_BOOL => Value::Boolean(r.ioread::<u8>()? != 0),
        VALUE_INT64 => Value::Integer(r.ioread_with(LE)?),
        VALUE_FLOAT64 => Value::Float(r.ioread_with(LE)?),
        VALUE_STRING => Value::String(read_string(r)?),
        VALUE_ARRAY => Value::Array(read_value_seq(r)?),
        VALUE_SET => Value::Set(read_value_seq(r)?),
        VALUE_MAP => {
            let len: u32 = r.ioread_with(LE)?;
            let mut entries = Vec::with_capacity(len as usize);
            for _ in 0..len {
                let key = read_string(r)?;
                let value = read_value(r)?;
                entries.push((key, value));
            }
            Value::Map(entries)
        }
        VALUE_COLOR => {
            let red: u8 = r.ioread()?;
            let green: u8 = r.ioread()?;
            let blue: u8 = r.ioread()?;
            let alpha = read_option_u8(r)?;
            Value::Color(Color {
                r: red,
                g: green,
                b: blue,
                a: alpha,
            })
        }
        VALUE_COORD => {
            let x: f64 = r.ioread_with(LE)?;
            let y: f64 = r.ioread_with(LE)?;
            let z = read_option_f64(r)?;
            Value::Coord(Coord { x, y, z })
        }
        VALUE_PATH => Value::Path(PathValue { text: read_string(r)? }),
        VALUE_DYNAMIC => Value::Dynamic(Box::new(read_value(r)?)),
        other => return Err(Error::Malformed(format!("unknown value tag {other:#x}"))),
    })
}

fn read_value_seq(r: &mut impl Read) -> Result<Vec<Value>> {
    let len: u32 = r.ioread_with(LE)?;
    let mut items = Vec::with_capacity(len as usize);
    for _ in 0..len {
        items.push(read_value(r)?);
    }
    Ok(items)
}

fn read_option_u8(r: &mut impl Read) -> Result<Option<u8>> {
    let present: u8 = r.ioread()?;
    if present != 0 {
        Ok(Some(r.ioread()?))
    } else {
        Ok(None)
    }
}

fn read_option_f64(r: &mut impl Read) -> Result<Option<f64>> {
    let present: u8 = r.ioread()?;
    if present != 0 {
        Ok(Some(r.ioread_with(LE)?))
    } else {
        Ok(None)
    }
}
