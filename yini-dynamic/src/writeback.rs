//! Non-destructive write-back (spec.md §4.9): rewrites only the value span of
//! each dirty `Dyna(...)` site, leaving every other byte of the file -
//! including the `Dyna(` / `)` wrapper itself and any trailing comment -
//! untouched. New keys staged against a zero/append origin are appended as
//! plain `key = value` lines at the end of the file, per spec.md §4.9's
//! literal wording for the unknown-origin case (no `Dyna(...)` wrapper is
//! re-introduced, so a key appended this way reloads as an ordinary static
//! value rather than staying settable).
//!
//! Grounded on `diskplan-filesystem/src/lib.rs`'s RAII file-handle discipline
//! and `tempfile` for an atomic rename-into-place.

use std::io::Write as _;

use camino::Utf8Path;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::tracker::{DirtyEntry, Tracker};

/// Applies every dirty entry in `tracker` against `source_text`, returning
/// the rewritten text without touching disk.
pub fn apply(tracker: &Tracker, source_text: &str) -> Result<String> {
    let mut lines: Vec<String> = source_text.split('\n').map(str::to_string).collect();
    let mut appends: Vec<&DirtyEntry> = Vec::new();

    for entry in tracker.dirty_entries() {
        let site = tracker.site(&entry.section, &entry.key).ok_or_else(|| {
            Error::WriteBackFailed(format!("no site recorded for {}.{}", entry.section, entry.key))
        })?;

        if site.is_append() {
            appends.push(entry);
            continue;
        }

        let line_idx = (site.line as usize).saturating_sub(1);
        let line = lines
            .get(line_idx)
            .ok_or_else(|| Error::WriteBackFailed(format!("line {} out of range", site.line)))?;

        let start = (site.inner_start_column as usize).saturating_sub(1).min(line.len());
        let end = (site.inner_end_column as usize).saturating_sub(1).min(line.len());
        if start > end {
            return Err(Error::WriteBackFailed(format!("malformed value span on line {}", site.line)));
        }

        let mut rewritten = String::with_capacity(line.len());
        rewritten.push_str(&line[..start]);
        rewritten.push_str(&entry.value.to_string());
        rewritten.push_str(&line[end..]);
        lines[line_idx] = rewritten;
    }

    for entry in appends {
        let header = format!("[{}]", entry.section);
        if !lines.iter().any(|l| l.trim() == header) {
            if lines.last().map(|l| !l.is_empty()).unwrap_or(false) {
                lines.push(String::new());
            }
            lines.push(header);
        }
        lines.push(format!("{} = {}", entry.key, entry.value));
    }

    Ok(lines.join("\n"))
}

/// Applies dirty changes and atomically rewrites `path` on disk: write to a
/// sibling temp file, `fsync`, then rename over the original. On rename
/// failure the temp file is discarded and the original is left untouched.
pub fn save_to_path(tracker: &mut Tracker, path: impl AsRef<Utf8Path>, source_text: &str) -> Result<String> {
    let path = path.as_ref();
    let rewritten = apply(tracker, source_text)?;

    let dir = path
        .parent()
        .map(|p| p.as_std_path())
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(rewritten.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path.as_std_path())
        .map_err(|e| Error::WriteBackFailed(format!("rename failed: {}", e.error)))?;

    tracker.clear_dirty();
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use camino::Utf8PathBuf;
    use yini_syntax::Value;

    use super::*;
    use crate::tracker::Tracker;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn s4_set_and_writeback_preserves_comment_and_other_lines() {
        let source = "[Settings]\nname = \"studio\"\nvolume = Dyna(100) // master\nbrightness = 5\n";
        let loaded = yini_runtime::load_from_text_and_resolve(source, "s4.yini", &no_env).expect("resolves");

        let root_file = Arc::new(Utf8PathBuf::from("s4.yini"));
        let mut tracker = Tracker::new(&loaded.resolved, root_file, source);
        let mut resolved = loaded.resolved;

        tracker
            .set_value(&mut resolved, "Settings", "volume", Value::Integer(75))
            .expect("volume is dynamic");

        let rewritten = apply(&tracker, source).expect("apply");
        assert_eq!(
            rewritten,
            "[Settings]\nname = \"studio\"\nvolume = Dyna(75) // master\nbrightness = 5\n"
        );

        let reloaded = yini_runtime::load_from_text_and_resolve(&rewritten, "s4.yini", &no_env).expect("resolves");
        assert_eq!(
            reloaded.resolved.get_unwrapped("Settings", "volume"),
            Some(&Value::Integer(75))
        );
        assert_eq!(
            reloaded.resolved.get_unwrapped("Settings", "brightness"),
            Some(&Value::Integer(5))
        );
    }

    #[test]
    fn appends_new_key_when_section_exists_but_key_does_not() {
        let source = "[Settings]\nvolume = Dyna(100)\n";
        let loaded = yini_runtime::load_from_text_and_resolve(source, "s4b.yini", &no_env).expect("resolves");

        let root_file = Arc::new(Utf8PathBuf::from("s4b.yini"));
        let mut tracker = Tracker::new(&loaded.resolved, root_file, source);
        let mut resolved = loaded.resolved;

        tracker
            .set_value(&mut resolved, "Settings", "balance", Value::Integer(0))
            .expect("section exists, key is new");

        let rewritten = apply(&tracker, source).expect("apply");
        assert!(rewritten.contains("balance = 0"));

        let reloaded = yini_runtime::load_from_text_and_resolve(&rewritten, "s4b.yini", &no_env).expect("resolves");
        assert_eq!(
            reloaded.resolved.get_unwrapped("Settings", "balance"),
            Some(&Value::Integer(0))
        );
    }

    #[test]
    fn save_to_path_writes_atomically_and_clears_dirty_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("live.yini")).expect("utf8 path");
        let source = "[Settings]\nvolume = Dyna(100)\n";
        std::fs::write(&path, source).expect("seed file");

        let loaded = yini_runtime::load_from_text_and_resolve(source, path.as_str(), &no_env).expect("resolves");
        let root_file = Arc::new(Utf8PathBuf::from(path.as_str()));
        let mut tracker = Tracker::new(&loaded.resolved, root_file, source);
        let mut resolved = loaded.resolved;

        tracker
            .set_value(&mut resolved, "Settings", "volume", Value::Integer(42))
            .expect("dynamic");

        let written = save_to_path(&mut tracker, &path, source).expect("save");
        assert!(written.contains("volume = Dyna(42)"));
        assert_eq!(tracker.dirty_entries().count(), 0);

        let on_disk = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(on_disk, written);
    }
}
