//! Hand-rolled `Value` to JSON-text conversion for `export-json`. Not a
//! general JSON library: covers exactly the `Value` shapes the resolver can
//! produce, and exists to make the verb runnable, not to reintroduce pretty-
//! printing or schema inference as a library capability.

use yini_syntax::Value;

pub fn document_to_json(resolved: &yini_runtime::resolved::ResolvedConfig) -> String {
    let mut out = String::from("{");
    for (i, (name, section)) in resolved.sections.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(&mut out, name);
        out.push(':');
        out.push('{');
        for (j, (key, value)) in section.entries.iter().enumerate() {
            if j > 0 {
                out.push(',');
            }
            write_string(&mut out, key);
            out.push(':');
            write_value(&mut out, value.unwrap_dynamic());
        }
        out.push('}');
    }
    out.push('}');
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Integer(i) => out.push_str(&i.to_string()),
        Value::Float(x) => out.push_str(&format_json_float(*x)),
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::String(s) => write_string(out, s),
        Value::Array(items) | Value::Set(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Map(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, value);
            }
            out.push('}');
        }
        Value::Color(c) => {
            out.push('{');
            write_string(out, "r");
            out.push(':');
            out.push_str(&c.r.to_string());
            out.push(',');
            write_string(out, "g");
            out.push(':');
            out.push_str(&c.g.to_string());
            out.push(',');
            write_string(out, "b");
            out.push(':');
            out.push_str(&c.b.to_string());
            if let Some(a) = c.a {
                out.push(',');
                write_string(out, "a");
                out.push(':');
                out.push_str(&a.to_string());
            }
            out.push('}');
        }
        Value::Coord(coord) => {
            out.push('{');
            write_string(out, "x");
            out.push(':');
            out.push_str(&format_json_float(coord.x));
            out.push(',');
            write_string(out, "y");
            out.push(':');
            out.push_str(&format_json_float(coord.y));
            if let Some(z) = coord.z {
                out.push(',');
                write_string(out, "z");
                out.push(':');
                out.push_str(&format_json_float(z));
            }
            out.push('}');
        }
        Value::Path(p) => write_string(out, &p.text),
        // unwrap_dynamic is applied at the call site, but a nested Dynamic
        // (inside an array/map) is possible in principle; fall through.
        Value::Dynamic(inner) => write_value(out, inner),
    }
}

fn format_json_float(x: f64) -> String {
    if x.fract() == 0.0 && x.is_finite() {
        format!("{x:.1}")
    } else {
        x.to_string()
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use yini_runtime::resolved::{OrderedMap, ResolvedConfig, ResolvedSection};

    #[test]
    fn escapes_control_characters_and_quotes() {
        let mut out = String::new();
        write_string(&mut out, "a\"b\nc");
        assert_eq!(out, "\"a\\\"b\\nc\"");
    }

    #[test]
    fn renders_nested_sections_and_arrays() {
        let mut entries = OrderedMap::new();
        entries.insert("items", Value::Array(vec![Value::Integer(1), Value::Integer(2)]));
        let mut sections = OrderedMap::new();
        sections.insert(
            "A",
            ResolvedSection {
                entries,
                origins: OrderedMap::new(),
            },
        );
        let resolved = ResolvedConfig {
            sections,
            macros: OrderedMap::new(),
        };
        assert_eq!(document_to_json(&resolved), r#"{"A":{"items":[1,2]}}"#);
    }
}
