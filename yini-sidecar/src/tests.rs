use yini_syntax::Value;

use crate::{decode, encode, DynamicEntry};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn round_trips_sections_defines_and_dynamic_state() {
    let loaded = yini_runtime::load_from_text_and_resolve(
        "[#define]\nbase = 10\n[A]\nx = @base\ny = \"hi\"\nz = Color(1, 2, 3)\nvol = Dyna(100)\n",
        "sidecar.yini",
        &no_env,
    )
    .expect("resolves");

    let dynamic_state = vec![DynamicEntry {
        section: "A".to_string(),
        key: "vol".to_string(),
        current: Value::Integer(75),
        history: vec![Value::Integer(100)],
    }];

    let bytes = encode::encode(&loaded.document, &loaded.resolved, &dynamic_state).expect("encode");
    let decoded = decode::decode(&bytes).expect("decode");

    assert_eq!(decoded.version, crate::format::VERSION);
    assert_eq!(decoded.defines, vec![("base".to_string(), Value::Integer(10))]);

    let section_a = decoded
        .sections
        .iter()
        .find(|s| s.name == "A")
        .expect("section A present");
    assert!(section_a.entries.contains(&("x".to_string(), Value::Integer(10))));
    assert!(section_a.entries.contains(&("y".to_string(), Value::String("hi".to_string()))));
    assert!(section_a.entries.iter().any(|(k, v)| k == "z"
        && matches!(v, Value::Color(c) if c.r == 1 && c.g == 2 && c.b == 3 && c.a.is_none())));
    assert!(section_a.entries.iter().any(|(k, v)| k == "vol" && matches!(v, Value::Dynamic(inner) if **inner == Value::Integer(100))));

    assert_eq!(decoded.dynamic_state.len(), 1);
    assert_eq!(decoded.dynamic_state[0].current, Value::Integer(75));
    assert_eq!(decoded.dynamic_state[0].history, vec![Value::Integer(100)]);
}

#[test]
fn rejects_bad_magic() {
    let err = decode::decode(b"NOPE").unwrap_err();
    assert!(matches!(err, crate::Error::BadMagic));
}

#[test]
fn rejects_unsupported_version() {
    let mut bytes = crate::format::MAGIC.to_vec();
    bytes.push(crate::format::VERSION + 1);
    let err = decode::decode(&bytes).unwrap_err();
    assert!(matches!(err, crate::Error::UnsupportedVersion(_, _)));
}
