//! End-to-end scenarios from spec.md §8 that exercise the Loader, Resolver,
//! and Schema Validator together (S1-S3, S5-S7; S4 dynamic write-back lives
//! in `yini-dynamic`).

use camino::Utf8PathBuf;

use crate::error::Error;
use crate::{load_and_resolve, load_from_text_and_resolve};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn s1_macro_arithmetic() {
    let loaded = load_from_text_and_resolve(
        "[#define]\nbase = 10\n[A]\nval = @base * (2+3)\n",
        "s1.yini",
        &no_env,
    )
    .expect("resolves");
    let value = loaded.resolved.get_unwrapped("A", "val").expect("A.val present");
    assert_eq!(value, &yini_syntax::Value::Integer(50));
}

#[test]
fn s2_cross_reference_chain() {
    let loaded = load_from_text_and_resolve(
        "[A]\nval = 10\n[B]\nval = @{A.val} * 2\n[C]\nval = @{B.val} + 5\n",
        "s2.yini",
        &no_env,
    )
    .expect("resolves");
    assert_eq!(
        loaded.resolved.get_unwrapped("C", "val"),
        Some(&yini_syntax::Value::Integer(25))
    );
}

#[test]
fn s3_diamond_inheritance_last_parent_wins() {
    let loaded = load_from_text_and_resolve(
        "[Left]\nv = \"left\"\n[Right]\nv = \"right\"\n[Child]: Left, Right\n",
        "s3.yini",
        &no_env,
    )
    .expect("resolves");
    assert_eq!(
        loaded.resolved.get_unwrapped("Child", "v"),
        Some(&yini_syntax::Value::String("right".to_string()))
    );
}

#[test]
fn s5_include_merge() {
    let dir = Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .expect("utf8 temp dir")
        .join(format!("yini-runtime-test-s5-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");

    std::fs::write(dir.join("one.yini"), "[Shared]\nk1 = 1\nk2 = \"one\"\n").unwrap();
    std::fs::write(dir.join("two.yini"), "[Shared]\nk2 = \"two\"\nk3 = 3\n").unwrap();
    std::fs::write(
        dir.join("root.yini"),
        "[#include]\n+= \"one.yini\"\n+= \"two.yini\"\n[Shared]\nk2 = \"root\"\n",
    )
    .unwrap();

    let loaded = load_and_resolve(dir.join("root.yini"), 16, &no_env).expect("resolves");

    assert_eq!(
        loaded.resolved.get_unwrapped("Shared", "k2"),
        Some(&yini_syntax::Value::String("root".to_string()))
    );
    assert_eq!(
        loaded.resolved.get_unwrapped("Shared", "k1"),
        Some(&yini_syntax::Value::Integer(1))
    );
    assert_eq!(
        loaded.resolved.get_unwrapped("Shared", "k3"),
        Some(&yini_syntax::Value::Integer(3))
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn s6_schema_default_injection() {
    let loaded = load_from_text_and_resolve(
        "[#schema]\n[Cfg]\nport = int, required, =8080\n[#end_schema]\n\n[Cfg]\n",
        "s6.yini",
        &no_env,
    )
    .expect("resolves");

    assert!(
        loaded.validation_errors.is_empty(),
        "unexpected validation errors: {:?}",
        loaded.validation_errors
    );
    assert_eq!(
        loaded.resolved.get_unwrapped("Cfg", "port"),
        Some(&yini_syntax::Value::Integer(8080))
    );
}

#[test]
fn s7_circular_reference() {
    let loaded = load_from_text_and_resolve(
        "[X]\na = @{X.b}\n[X]\nb = @{X.a}\n",
        "s7.yini",
        &no_env,
    )
    .expect("load succeeds; the cycle is a collected diagnostic, not a fatal error");
    assert!(
        loaded
            .resolve_errors
            .iter()
            .any(|err| matches!(err, Error::CircularReference(_))),
        "expected a CircularReference diagnostic, got {:?}",
        loaded.resolve_errors
    );
}
