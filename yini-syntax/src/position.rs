//! Source positions, shared by every diagnostic in the pipeline (spec.md §7:
//! "Every error carries: kind, message, file path, line, column...").

use std::fmt;
use std::sync::Arc;

use camino::Utf8PathBuf;

/// A location within a source file. Line and column are 1-based, the byte
/// offset is 0-based — resolved per `original_source`'s `YiniException`
/// convention (see `SPEC_FULL.md` §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file: Arc<Utf8PathBuf>,
    pub line: u32,
    pub column: u32,
    pub byte_offset: u32,
}

impl Position {
    pub fn new(file: Arc<Utf8PathBuf>, line: u32, column: u32, byte_offset: u32) -> Self {
        Position {
            file,
            line,
            column,
            byte_offset,
        }
    }

    /// A placeholder position for synthesized values that have no source
    /// site (e.g. a schema default injected where no key was written).
    pub fn synthetic() -> Self {
        Position {
            file: Arc::new(Utf8PathBuf::from("<synthetic>")),
            line: 0,
            column: 0,
            byte_offset: 0,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Tracks line-start byte offsets so later stages can turn a byte offset back
/// into a (line, column) pair without rescanning the whole file each time.
/// Built lazily and cached once per source, mirroring
/// `diskplan_schema::text::ParseError::line_number`'s approach but amortized
/// across many positions instead of recomputed per error.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (offset, ch) in text.char_indices() {
            if ch == '\n' {
                line_starts.push(offset as u32 + 1);
            }
        }
        LineIndex { line_starts }
    }

    /// Returns the 1-based (line, column) for a 0-based byte offset.
    pub fn line_column(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        (line_idx as u32 + 1, byte_offset - line_start + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_column_tracks_newlines() {
        let index = LineIndex::new("abc\ndef\nghi");
        assert_eq!(index.line_column(0), (1, 1));
        assert_eq!(index.line_column(3), (1, 4));
        assert_eq!(index.line_column(4), (2, 1));
        assert_eq!(index.line_column(8), (3, 1));
    }
}
