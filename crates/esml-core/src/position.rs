//! # Source Positions
//!
//! Converts byte offsets in the source text into 1-based (line, column)
//! pairs for error reporting. Lines break on `\n`; columns count Unicode
//! scalar values, so a multi-byte character occupies one column.

use std::fmt;

use serde::Serialize;

/// A 1-based line/column location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

/// Precomputed line starts for one source text.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    /// Byte offset of the first character of each line. Always starts with 0.
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Index the line starts of `text`.
    pub fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                text.bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        Self { text, line_starts }
    }

    /// Convert a byte offset into a position.
    ///
    /// Offsets past the end clamp to the end of the text; offsets inside a
    /// multi-byte character clamp back to that character's start.
    pub fn position(&self, offset: usize) -> Position {
        let offset = self.floor_char_boundary(offset);
        let line_idx = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line_idx];
        let column = self.text[line_start..offset].chars().count() + 1;
        Position {
            line: line_idx + 1,
            column,
        }
    }

    /// Convert a 1-based line and 1-based *byte* column back into an offset.
    ///
    /// This is the coordinate system `serde_json` reports decode failures in.
    /// Out-of-range coordinates clamp to the nearest valid offset.
    pub fn offset_of(&self, line: usize, byte_column: usize) -> usize {
        let line_idx = line.clamp(1, self.line_starts.len()) - 1;
        let line_start = self.line_starts[line_idx];
        let line_end = self
            .line_starts
            .get(line_idx + 1)
            .map_or(self.text.len(), |next| next - 1);
        (line_start + byte_column.saturating_sub(1)).min(line_end)
    }

    fn floor_char_boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}
