//! Renders a decoded sidecar back into canonical YINI text for `decompile`.
//! Unlike `Value`'s `Display` impl (which never reintroduces a `Dyna(...)`
//! wrapper, since write-back always has an existing one to edit in place),
//! decompilation has no existing site to preserve — a dynamic entry is
//! written with an explicit `Dyna(...)` wrapper so the regenerated file
//! still round-trips as settable.

use yini_sidecar::DecodedSidecar;
use yini_syntax::Value;

pub fn decompile_to_text(sidecar: &DecodedSidecar) -> String {
    let mut out = String::new();

    if !sidecar.defines.is_empty() {
        out.push_str("[#define]\n");
        for (name, value) in &sidecar.defines {
            out.push_str(&format!("{name} = {}\n", render_value(value)));
        }
        out.push('\n');
    }

    for section in &sidecar.sections {
        out.push('[');
        out.push_str(&section.name);
        out.push(']');
        if !section.parents.is_empty() {
            out.push_str(": ");
            out.push_str(&section.parents.join(", "));
        }
        out.push('\n');
        for (key, value) in &section.entries {
            out.push_str(&format!("{key} = {}\n", render_value(value)));
        }
        out.push('\n');
    }

    out
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Dynamic(inner) => format!("Dyna({inner})"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yini_sidecar::{DecodedSection, DecodedSidecar};

    #[test]
    fn wraps_dynamic_entries_and_renders_parents() {
        let sidecar = DecodedSidecar {
            version: 1,
            defines: vec![],
            includes: vec![],
            sections: vec![DecodedSection {
                name: "Child".into(),
                parents: vec!["Base".into()],
                entries: vec![
                    ("static".into(), Value::Integer(1)),
                    ("live".into(), Value::Dynamic(Box::new(Value::Integer(2)))),
                ],
                quick_registers: vec![],
            }],
            dynamic_state: vec![],
        };

        let text = decompile_to_text(&sidecar);
        assert!(text.contains("[Child]: Base\n"));
        assert!(text.contains("static = 1\n"));
        assert!(text.contains("live = Dyna(2)\n"));
    }
}
