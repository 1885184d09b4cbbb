//! Façade-level end-to-end scenarios (spec.md §8) that need real files on
//! disk: S4 (dynamic write-back through `save()`), S5 (include merge), and
//! S6 (schema default injection). S1–S3 and S7 are exercised closer to the
//! crate that owns the behavior, in `yini-runtime/src/tests/scenarios.rs`.

use camino::Utf8PathBuf;
use yini_config::{Diagnostic, Document, Options};
use yini_syntax::Value;

fn no_env(_: &str) -> Option<String> {
    None
}

fn options() -> Options {
    Options {
        env_provider: std::sync::Arc::new(no_env),
        ..Options::default()
    }
}

fn scratch_dir(label: &str) -> Utf8PathBuf {
    let dir = Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .expect("utf8 temp dir")
        .join(format!("yini-config-test-{label}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[test]
fn s4_dynamic_set_and_save_round_trips_through_disk() {
    let dir = scratch_dir("s4");
    let path = dir.join("settings.yini");
    std::fs::write(
        &path,
        "[Settings]\nname = \"studio\"\nvolume = Dyna(100) // master\nbrightness = 5\n",
    )
    .unwrap();

    let mut doc = Document::load(&path, options()).expect("loads");
    assert_eq!(doc.get("Settings", "volume"), Some(&Value::Integer(100)));

    doc.set("Settings", "volume", Value::Integer(75)).expect("dynamic");
    doc.save().expect("atomic write-back");

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        on_disk,
        "[Settings]\nname = \"studio\"\nvolume = Dyna(75) // master\nbrightness = 5\n"
    );

    let reloaded = Document::load(&path, options()).expect("reloads");
    assert_eq!(reloaded.get("Settings", "volume"), Some(&Value::Integer(75)));
    assert_eq!(reloaded.get("Settings", "brightness"), Some(&Value::Integer(5)));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn s5_include_merge() {
    let dir = scratch_dir("s5");

    std::fs::write(dir.join("one.yini"), "[Shared]\nk1 = 1\nk2 = \"one\"\n").unwrap();
    std::fs::write(dir.join("two.yini"), "[Shared]\nk2 = \"two\"\nk3 = 3\n").unwrap();
    std::fs::write(
        dir.join("root.yini"),
        "[#include]\n+= \"one.yini\"\n+= \"two.yini\"\n[Shared]\nk2 = \"root\"\n",
    )
    .unwrap();

    let doc = Document::load(dir.join("root.yini"), options()).expect("loads");

    assert_eq!(doc.get("Shared", "k2"), Some(&Value::String("root".to_string())));
    assert_eq!(doc.get("Shared", "k1"), Some(&Value::Integer(1)));
    assert_eq!(doc.get("Shared", "k3"), Some(&Value::Integer(3)));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn s6_schema_default_injection() {
    let dir = scratch_dir("s6");
    let path = dir.join("cfg.yini");
    std::fs::write(
        &path,
        "[#schema]\n[Cfg]\nport = int, required, =8080\n[#end_schema]\n\n[Cfg]\n",
    )
    .unwrap();

    let doc = Document::load(&path, options()).expect("loads");

    assert!(
        !doc.diagnostics()
            .iter()
            .any(|d| matches!(d, Diagnostic::Validate(_))),
        "unexpected validation diagnostics: {:?}",
        doc.diagnostics()
    );
    assert_eq!(doc.get("Cfg", "port"), Some(&Value::Integer(8080)));
    assert_eq!(doc.schema().len(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn diagnostics_include_both_resolve_and_validate_kinds() {
    let dir = scratch_dir("diag");
    let path = dir.join("bad.yini");
    std::fs::write(
        &path,
        "[#schema]\n[Cfg]\nport = int, required\n[#end_schema]\n\n[X]\na = @{X.b}\n[X]\nb = @{X.a}\n",
    )
    .unwrap();

    let doc = Document::load(&path, options()).expect("loads; diagnostics are not fatal");

    assert!(doc
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::Resolve(yini_runtime::Error::CircularReference(_)))));
    assert!(doc
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::Validate(yini_runtime::ValidationError::MissingSection { .. }))));

    std::fs::remove_dir_all(&dir).ok();
}
