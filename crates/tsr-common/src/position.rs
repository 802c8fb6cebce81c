//! Line/column mapping for byte offsets.
//!
//! Diagnostics store byte offsets; rendering needs `line:column`. A `LineMap`
//! is built once per source file from the newline positions and answers
//! offset-to-position queries with a binary search.

use serde::Serialize;

/// A 1-based line/column position in a source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets to line/column positions.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offset of the start of each line. `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        LineMap { line_starts }
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// The 1-based line number containing a byte offset.
    pub fn line(&self, offset: u32) -> u32 {
        self.position(offset).line
    }

    /// The 1-based line/column position of a byte offset.
    pub fn position(&self, offset: u32) -> Position {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        Position {
            line: line_idx as u32 + 1,
            column: offset - self.line_starts[line_idx] + 1,
        }
    }
}
