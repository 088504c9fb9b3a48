//! Text positions: numeric coordinates and line anchors.
//!
//! Two ways of naming a spot in a buffer live here:
//!
//! - [`Position`]: a 0-indexed `(line, col)` pair. Stable only as long as no
//!   line is inserted or removed above it. Used for display and for tests.
//! - [`Anchor`]: a `(line handle, col)` pair. It follows its line through
//!   edits elsewhere in the buffer, which is what window cursors, window marks
//!   and named marks need. Anchors are weak: they never keep a line alive, and
//!   undo/redo replay is responsible for repointing them when it swaps lines.
//!
//! Columns are **byte** offsets into the line's text. Lines are stored as raw
//! bytes so that undo can restore them byte-for-byte regardless of encoding.
//!
//! Display layers should convert to 1-indexed for the user; that conversion
//! never belongs here.

use std::fmt;

use crate::line::LineId;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A position in a text buffer: (line, column), both 0-indexed.
///
/// `col` is a byte offset from the start of the line.
///
/// # Ordering
///
/// Positions are ordered lexicographically: line first, then column. This means
/// `Position { line: 0, col: 5 }` < `Position { line: 1, col: 0 }`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The origin, line 0 column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

// Natural ordering: line first, then column.
impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed for human display, matching Vim's `line:col` status.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

// ---------------------------------------------------------------------------
// Anchor
// ---------------------------------------------------------------------------

/// A position pinned to a line record rather than to a line number.
///
/// An anchor names a line by its [`LineId`], so inserting or deleting other
/// lines does not disturb it. It does not own the line: if the line leaves the
/// live ring, the anchor is stale until something repoints it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    pub line: LineId,
    pub col: usize,
}

impl Anchor {
    /// Create an anchor at byte offset `col` of `line`.
    #[inline]
    #[must_use]
    pub const fn new(line: LineId, col: usize) -> Self {
        Self { line, col }
    }

    /// The same line, with the column clamped to `len`.
    #[inline]
    #[must_use]
    pub const fn clamped(self, len: usize) -> Self {
        Self {
            line: self.line,
            col: if self.col < len { self.col } else { len },
        }
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Anchor({:?}+{})", self.line, self.col)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
