//! The façade's options record (spec.md §9 "Configuration options"). One
//! closed struct with no flatten/dynamic-field escape hatch — unlike a
//! `Deserialize` impl with `#[serde(flatten)]`, an unrecognized field simply
//! can't be constructed, so "unknown fields must be rejected" holds
//! structurally rather than needing a runtime check.

use std::sync::Arc;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};

/// Looks up an environment variable by name for `${NAME}`/`${NAME:default}`
/// references (spec.md §4.5).
pub type EnvProvider = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Supplies the current time, for sidecar freshness checks and any
/// timestamp-tagged diagnostics (spec.md §9's `now_fn`).
pub type Clock = Arc<dyn Fn() -> SystemTime + Send + Sync>;

/// Maps a source path to the sidecar path that should cache/persist it.
pub type SidecarPathFn = Arc<dyn Fn(&Utf8Path) -> Utf8PathBuf + Send + Sync>;

#[derive(Clone)]
pub struct Options {
    /// Whether an `#include` cycle is tolerated (elided, with a warning) or
    /// rejected outright. Default `true`, matching `yini-runtime::loader`'s
    /// unconditional elision behavior.
    pub allow_cycles_in_include: bool,
    pub env_provider: EnvProvider,
    pub now_fn: Clock,
    pub max_include_depth: u32,
    pub sidecar_path_fn: SidecarPathFn,
}

impl Options {
    pub fn new() -> Self {
        Options::default()
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            allow_cycles_in_include: true,
            env_provider: Arc::new(|name: &str| std::env::var(name).ok()),
            now_fn: Arc::new(SystemTime::now),
            max_include_depth: 32,
            sidecar_path_fn: Arc::new(default_sidecar_path),
        }
    }
}

fn default_sidecar_path(source: &Utf8Path) -> Utf8PathBuf {
    source.with_extension("ymeta")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sidecar_path_swaps_extension() {
        let path = Utf8PathBuf::from("/etc/app/config.yini");
        assert_eq!(default_sidecar_path(&path), Utf8PathBuf::from("/etc/app/config.ymeta"));
    }

    #[test]
    fn defaults_match_spec() {
        let options = Options::default();
        assert!(options.allow_cycles_in_include);
        assert_eq!(options.max_include_depth, 32);
    }
}
