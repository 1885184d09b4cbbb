//! Source Reader (spec.md §4.1): reads a file's contents, exposes a
//! byte-offset-to-(line, column) map, and canonicalizes paths so inclusion
//! cycles can be detected by identity.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::position::LineIndex;

/// The text of a single source file together with the path it was loaded
/// from and a lazily-usable line index. Mirrors `SchemaCache`'s pairing of a
/// file's text with its parsed form, one read per path.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: Arc<Utf8PathBuf>,
    pub text: Arc<str>,
    pub line_index: LineIndex,
}

impl SourceFile {
    pub fn new(path: Utf8PathBuf, text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        SourceFile {
            path: Arc::new(path),
            text,
            line_index,
        }
    }

    /// Reads the file at `path` from disk.
    pub fn read(path: impl AsRef<Utf8Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Ok(SourceFile::new(path.to_owned(), text))
    }

    /// Wraps in-memory text with a virtual path, for `load_from_text` (no
    /// file I/O, spec.md §6).
    pub fn virtual_text(virtual_path: impl AsRef<Utf8Path>, text: impl Into<Arc<str>>) -> Self {
        SourceFile::new(virtual_path.as_ref().to_owned(), text)
    }
}

/// Collapses `.`/`..` and symbolic links via the operating system, falling
/// back to a lexical collapse for paths that don't exist on disk (virtual
/// paths used by `load_from_text`, or include targets checked before they're
/// read).
pub fn canonicalize(path: impl AsRef<Utf8Path>) -> Utf8PathBuf {
    let path = path.as_ref();
    match std::fs::canonicalize(path) {
        Ok(canon) => Utf8PathBuf::from_path_buf(canon).unwrap_or_else(|_| lexical_collapse(path)),
        Err(_) => lexical_collapse(path),
    }
}

fn lexical_collapse(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        use camino::Utf8Component::*;
        match component {
            CurDir => {}
            ParentDir => {
                out.pop();
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_collapse_removes_dot_and_dotdot() {
        assert_eq!(
            lexical_collapse(Utf8Path::new("/a/./b/../c")),
            Utf8PathBuf::from("/a/c")
        );
    }
}
