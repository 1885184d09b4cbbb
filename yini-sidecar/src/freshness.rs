//! Cache freshness check (spec.md §4.7): "the sidecar is considered valid
//! for a source file iff the sidecar's stored modification-time is ≥ the
//! source's and the version byte matches."

use std::time::SystemTime;

use camino::Utf8Path;
use log::debug;

use crate::decode::peek_version;
use crate::error::Result;
use crate::format::VERSION;

/// Pure freshness predicate, given already-read mtimes and version byte —
/// the part of this check that's worth unit-testing without touching a
/// filesystem.
pub fn is_fresh(source_mtime: SystemTime, sidecar_mtime: SystemTime, sidecar_version: u8) -> bool {
    sidecar_version == VERSION && sidecar_mtime >= source_mtime
}

/// Reads both files' modification times from disk and the sidecar's version
/// byte (without decoding the rest of it) to decide whether `sidecar_path`
/// can be trusted in place of re-parsing `source_path`.
pub fn check_path_freshness(source_path: impl AsRef<Utf8Path>, sidecar_path: impl AsRef<Utf8Path>) -> Result<bool> {
    let source_path = source_path.as_ref();
    let sidecar_path = sidecar_path.as_ref();

    let source_mtime = match std::fs::metadata(source_path).and_then(|m| m.modified()) {
        Ok(mtime) => mtime,
        Err(_) => return Ok(false),
    };
    let sidecar_bytes = match std::fs::read(sidecar_path) {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };
    let sidecar_mtime = std::fs::metadata(sidecar_path)?.modified()?;
    let version = peek_version(&sidecar_bytes)?;

    let fresh = is_fresh(source_mtime, sidecar_mtime, version);
    if !fresh {
        debug!("sidecar {sidecar_path} is stale relative to {source_path}");
    }
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fresh_when_newer_and_matching_version() {
        let source = SystemTime::UNIX_EPOCH;
        let sidecar = source + Duration::from_secs(1);
        assert!(is_fresh(source, sidecar, VERSION));
    }

    #[test]
    fn stale_when_older() {
        let sidecar = SystemTime::UNIX_EPOCH;
        let source = sidecar + Duration::from_secs(1);
        assert!(!is_fresh(source, sidecar, VERSION));
    }

    #[test]
    fn stale_when_version_mismatch() {
        let t = SystemTime::UNIX_EPOCH;
        assert!(!is_fresh(t, t, VERSION + 1));
    }
}
