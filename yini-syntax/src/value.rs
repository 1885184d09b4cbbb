//! The resolved value model (spec.md §3) and its canonical textual form
//! (spec.md §6, "Value canonical formatter").

use std::fmt::{self, Display};

/// A fully resolved YINI value. Unlike the unresolved [`crate::ast::Expr`]
/// nodes it may appear in, a `Value` never contains a macro reference,
/// cross-reference, environment reference, or arithmetic node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    /// Ordered sequence, duplicates allowed.
    Array(Vec<Value>),
    /// Ordered sequence, duplicates rejected at construction time (see
    /// `DESIGN.md`'s Open Question (c)).
    Set(Vec<Value>),
    /// Insertion-ordered mapping; kept as a `Vec` rather than a `HashMap` so
    /// round-tripping through the sidecar and write-back never reorders keys,
    /// the same reason `DirectorySchema::entries` is a sorted `Vec` rather
    /// than a map in the teacher.
    Map(Vec<(String, Value)>),
    Color(Color),
    Coord(Coord),
    Path(PathValue),
    /// A value wrapped by `Dyna(...)`. Nesting is rejected by the parser and
    /// evaluator (`Error::NestedDyna`), so this never recurses more than one
    /// level deep in practice.
    Dynamic(Box<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathValue {
    pub text: String,
}

impl Value {
    /// Unwraps one level of `Dynamic`, as `Document::get` must (spec.md §6).
    pub fn unwrap_dynamic(&self) -> &Value {
        match self {
            Value::Dynamic(inner) => inner,
            other => other,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Value::Dynamic(_))
    }

    /// A short, case-insensitive type name used by schema diagnostics and the
    /// `satisfies` predicate in `yini-runtime::validate`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Boolean(_) => "bool",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Color(_) => "color",
            Value::Coord(_) => "coord",
            Value::Path(_) => "path",
            Value::Dynamic(inner) => inner.type_name(),
        }
    }
}

/// Renders a float with a decimal point and never in scientific notation, as
/// the canonical formatter requires (spec.md §6) for both top-level `Float`
/// values and the doubles inside a `Coord`.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.fract() == 0.0 && x.is_finite() {
        write!(f, "{x:.1}")
    } else {
        write!(f, "{x}")
    }
}

/// Formats a string literal the way the lexer would need to re-read it:
/// `"`-delimited with minimal escaping of `\`, `"`, and control characters.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in s.chars() {
        match ch {
            '\\' => write!(f, "\\\\")?,
            '"' => write!(f, "\\\"")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            other => write!(f, "{other}")?,
        }
    }
    write!(f, "\"")
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write_float(f, *x),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::String(s) => write_quoted(f, s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Color(Color { r, g, b, a: None }) => write!(f, "Color({r}, {g}, {b})"),
            Value::Color(Color {
                r,
                g,
                b,
                a: Some(a),
            }) => write!(f, "Color({r}, {g}, {b}, {a})"),
            Value::Coord(Coord { x, y, z: None }) => {
                write!(f, "Coord(")?;
                write_float(f, *x)?;
                write!(f, ", ")?;
                write_float(f, *y)?;
                write!(f, ")")
            }
            Value::Coord(Coord { x, y, z: Some(z) }) => {
                write!(f, "Coord(")?;
                write_float(f, *x)?;
                write!(f, ", ")?;
                write_float(f, *y)?;
                write!(f, ", ")?;
                write_float(f, *z)?;
                write!(f, ")")
            }
            Value::Path(PathValue { text }) => {
                write!(f, "Path(")?;
                write_quoted(f, text)?;
                write!(f, ")")
            }
            // Write-back never introduces a Dyna(...) wrapper of its own; the
            // original source site already carries one (spec.md §6).
            Value::Dynamic(inner) => write!(f, "{inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_integer_and_float_distinctly() {
        assert_eq!(Value::Integer(5).to_string(), "5");
        assert_eq!(Value::Float(5.0).to_string(), "5.0");
        assert_eq!(Value::Float(5.25).to_string(), "5.25");
    }

    #[test]
    fn formats_set_singleton_with_trailing_comma() {
        assert_eq!(Value::Set(vec![Value::Integer(1)]).to_string(), "(1,)");
        assert_eq!(
            Value::Set(vec![Value::Integer(1), Value::Integer(2)]).to_string(),
            "(1, 2)"
        );
    }

    #[test]
    fn formats_map_preserving_order() {
        let map = Value::Map(vec![
            ("b".into(), Value::Integer(2)),
            ("a".into(), Value::Integer(1)),
        ]);
        assert_eq!(map.to_string(), "{b: 2, a: 1}");
    }

    #[test]
    fn formats_color_and_coord() {
        assert_eq!(
            Value::Color(Color {
                r: 255,
                g: 0,
                b: 0,
                a: None
            })
            .to_string(),
            "Color(255, 0, 0)"
        );
        assert_eq!(
            Value::Coord(Coord {
                x: 1.0,
                y: 2.0,
                z: Some(3.0)
            })
            .to_string(),
            "Coord(1.0, 2.0, 3.0)"
        );
    }

    #[test]
    fn escapes_strings_minimally() {
        assert_eq!(
            Value::String("line\n\"quoted\"".into()).to_string(),
            "\"line\\n\\\"quoted\\\"\""
        );
    }

    #[test]
    fn unwraps_dynamic_one_level() {
        let v = Value::Dynamic(Box::new(Value::Integer(3)));
        assert_eq!(v.unwrap_dynamic(), &Value::Integer(3));
    }
}
