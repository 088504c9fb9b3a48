//! Text buffer: the live line ring, its change history, and the windows
//! looking at it.
//!
//! A `Buffer` owns one [`LineStore`]. Every record in that store is reachable
//! from exactly one of three places: the live ring, the Back stack, or the
//! Forward stack. The editing primitives below are the only way the ring
//! changes outside of replay, and each one calls the change recorder *before*
//! touching the ring so the pre-edit state is still there to save.
//!
//! # Design choices
//!
//! - **Columns are byte offsets.** Lines are stored as raw bytes, exactly as
//!   loaded. Nothing here decodes UTF-8; display width is someone else's job.
//!
//! - **There is always at least one line.** Deleting the only line empties it
//!   instead, the same as `dd` on a one-line file.
//!
//! - **Recording is best-effort.** When the history cannot allocate, the edit
//!   still happens and only loses its undo record. A primitive returns
//!   `false`/`None` only when the edit itself could not be made.
//!
//! - **Line endings are detected on load** and used by
//!   [`contents`](Buffer::contents) to join the lines back together.

use std::collections::HashSet;
use std::fmt;

use crate::error::{Inconsistency, Outcome};
use crate::history::{Direction, History};
use crate::line::{Line, LineId, LineKind, Links};
use crate::options::UndoOptions;
use crate::position::{Anchor, Position};
use crate::store::{LineStore, try_copy};
use crate::window::{WinId, Windows};

// ---------------------------------------------------------------------------
// Line ending detection
// ---------------------------------------------------------------------------

/// Line ending style of loaded text.
///
/// Detected by scanning for the first occurrence. Defaults to `Lf` for new
/// buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
}

impl LineEnding {
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Detect the dominant line ending by finding the first occurrence.
    /// Returns `Lf` if there is none.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        for (i, &byte) in bytes.iter().enumerate() {
            match byte {
                b'\n' if i > 0 && bytes[i - 1] == b'\r' => return Self::CrLf,
                b'\n' => return Self::Lf,
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => return Self::CrLf,
                b'\r' => return Self::Cr,
                _ => {}
            }
        }
        Self::Lf
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => f.write_str("LF"),
            Self::CrLf => f.write_str("CRLF"),
            Self::Cr => f.write_str("CR"),
        }
    }
}

/// Split loaded text into lines. `\n`, `\r\n` and a lone `\r` each end a
/// line; a terminator at the very end does not open another one.
fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// One buffer: the live document plus everything needed to undo it.
pub struct Buffer {
    pub(crate) lines: LineStore,
    pub(crate) history: History,
    pub(crate) windows: Windows,
    pub(crate) modified: bool,
    line_ending: LineEnding,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// An empty buffer: one empty line, no history.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options("", &UndoOptions::default())
    }

    /// A buffer holding `text`, unmodified, cursor at the start.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::with_options(text, &UndoOptions::default())
    }

    #[must_use]
    pub fn with_options(text: &str, options: &UndoOptions) -> Self {
        let mut lines = LineStore::new();
        for line in split_lines(text) {
            lines.append(line.as_bytes().to_vec());
        }
        let first = match lines.first() {
            Some(first) => first,
            None => lines.append(Vec::new()),
        };
        Self {
            lines,
            history: History::new(options.undolevels),
            windows: Windows::new(Anchor::new(first, 0)),
            modified: false,
            line_ending: LineEnding::detect(text),
        }
    }

    // -- Text access --------------------------------------------------------

    /// The line store. Read-only: all changes go through the primitives.
    #[inline]
    #[must_use]
    pub const fn store(&self) -> &LineStore {
        &self.lines
    }

    /// Number of lines. Never zero.
    #[inline]
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Handle of line `n` (0-indexed).
    #[must_use]
    pub fn line_id(&self, n: usize) -> Option<LineId> {
        self.lines.nth(n)
    }

    /// Bytes of a live line.
    #[must_use]
    pub fn line(&self, id: LineId) -> Option<&[u8]> {
        if !self.lines.is_live(id) {
            return None;
        }
        self.lines.get(id).map(Line::text)
    }

    /// Bytes of line `n` (0-indexed).
    #[must_use]
    pub fn line_at(&self, n: usize) -> Option<&[u8]> {
        self.line_id(n).and_then(|id| self.line(id))
    }

    /// Every line, lossily decoded. Mostly for tests and debugging.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|id| self.lines.get(id))
            .map(|line| String::from_utf8_lossy(line.text()).into_owned())
            .collect()
    }

    /// The whole text, lines joined with the buffer's line ending.
    #[must_use]
    pub fn contents(&self) -> String {
        self.lines().join(self.line_ending.as_str())
    }

    // -- Positions ----------------------------------------------------------

    /// Numeric position of an anchor, if its line is live.
    #[must_use]
    pub fn position_of(&self, anchor: Anchor) -> Option<Position> {
        let line = self.lines.index_of(anchor.line)?;
        Some(Position::new(line, anchor.col))
    }

    /// Anchor for a numeric position. The column is clamped to the line.
    #[must_use]
    pub fn anchor_at(&self, pos: Position) -> Option<Anchor> {
        let id = self.lines.nth(pos.line)?;
        let len = self.lines.get(id)?.len();
        Some(Anchor::new(id, pos.col).clamped(len))
    }

    /// Cursor of the active window.
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> Anchor {
        self.windows.cursor()
    }

    #[must_use]
    pub fn cursor_position(&self) -> Position {
        self.position_of(self.cursor()).unwrap_or(Position::ZERO)
    }

    /// Move the active cursor. Returns false if the line does not exist.
    pub fn set_cursor(&mut self, pos: Position) -> bool {
        match self.anchor_at(pos) {
            Some(anchor) => {
                self.windows.set_cursor(anchor);
                true
            }
            None => false,
        }
    }

    // -- Windows and marks --------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn windows(&self) -> &Windows {
        &self.windows
    }

    /// Open another window on this buffer, its cursor where the active one is.
    pub fn open_window(&mut self) -> WinId {
        let cursor = self.windows.cursor();
        self.windows.open(cursor)
    }

    /// Close a window. The last window stays open.
    pub fn close_window(&mut self, id: WinId) -> bool {
        self.windows.close(id)
    }

    pub fn set_active_window(&mut self, id: WinId) -> bool {
        self.windows.set_active(id)
    }

    /// Set a window's `''` mark to a position, or clear it.
    pub fn set_window_mark(&mut self, id: WinId, pos: Option<Position>) -> bool {
        let mark = match pos {
            Some(pos) => match self.anchor_at(pos) {
                Some(anchor) => Some(anchor),
                None => return false,
            },
            None => None,
        };
        self.windows.set_mark_of(id, mark)
    }

    /// Set named mark `a`–`z` at a position.
    pub fn set_named_mark(&mut self, name: char, pos: Position) -> bool {
        self.anchor_at(pos)
            .is_some_and(|anchor| self.windows.set_named_mark(name, anchor))
    }

    /// Position of named mark `a`–`z`.
    #[must_use]
    pub fn named_mark(&self, name: char) -> Option<Position> {
        self.windows
            .named_mark(name)
            .and_then(|anchor| self.position_of(anchor))
    }

    // -- Metadata -----------------------------------------------------------

    /// True if the buffer differs from what was last saved (or loaded).
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// The buffer was written out. Undoing back to any earlier state now
    /// leaves it modified, so pure separators lose their meaning.
    pub fn mark_saved(&mut self) {
        self.modified = false;
        self.history.downgrade_pure(&mut self.lines);
    }

    /// Force the modified flag on, as for a change made outside the editing
    /// primitives.
    pub fn mark_modified(&mut self) {
        self.note_unrecorded_change();
    }

    #[inline]
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    // -- History introspection ----------------------------------------------

    #[inline]
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Batches that `undo_step` can replay.
    #[inline]
    #[must_use]
    pub const fn undo_count(&self) -> usize {
        self.history.batches(Direction::Back)
    }

    /// Batches that `redo_step` can replay.
    #[inline]
    #[must_use]
    pub const fn redo_count(&self) -> usize {
        self.history.batches(Direction::Forward)
    }

    /// Kinds of the records on one stack, top first.
    #[must_use]
    pub fn stacked_kinds(&self, dir: Direction) -> Vec<LineKind> {
        self.history
            .entries(&self.lines, dir)
            .map(|(_, line)| line.kind())
            .collect()
    }

    /// Allocated records, sentinel included.
    #[inline]
    #[must_use]
    pub fn records(&self) -> usize {
        self.lines.records()
    }

    /// Check the ownership invariants: the ring is consistently linked, each
    /// record is owned by exactly one of ring, Back and Forward, every record
    /// carries links that fit its kind, and the batch counters agree with the
    /// separators on each stack.
    ///
    /// # Errors
    ///
    /// The first [`Inconsistency`] found.
    pub fn audit(&self) -> Result<(), Inconsistency> {
        let head = self.lines.head();
        let mut owned = HashSet::new();

        let mut at = head;
        loop {
            let next = self.lines.next(at).ok_or(Inconsistency::LostBoundary(at))?;
            if self.lines.prev(next) != Some(at) {
                return Err(Inconsistency::LostBoundary(next));
            }
            if next == head {
                break;
            }
            if !owned.insert(next) {
                return Err(Inconsistency::Shared(next));
            }
            at = next;
        }

        for dir in [Direction::Back, Direction::Forward] {
            let mut separators = 0;
            for (id, line) in self.history.entries(&self.lines, dir) {
                if !owned.insert(id) {
                    return Err(Inconsistency::Shared(id));
                }
                let fits = match line.kind() {
                    LineKind::Real | LineKind::Placeholder => {
                        matches!(line.links(), Links::Stacked { .. })
                    }
                    LineKind::Patch => matches!(line.links(), Links::Patch { .. }),
                    LineKind::Separator | LineKind::PureSeparator => {
                        separators += 1;
                        matches!(line.links(), Links::Separator { .. })
                    }
                };
                if !fits {
                    return Err(Inconsistency::WrongRole(id));
                }
            }
            let recorded = self.history.batches(dir);
            if separators != recorded {
                return Err(Inconsistency::BatchCount {
                    counted: separators,
                    recorded,
                });
            }
        }

        let orphans = self.lines.records().saturating_sub(owned.len() + 1);
        if orphans > 0 {
            return Err(Inconsistency::Orphaned(orphans));
        }
        Ok(())
    }

    // -- Editing ------------------------------------------------------------

    /// Insert a new line after `at`. Passing the store's head inserts at the
    /// top. Returns the new line, or `None` if `at` is not in the ring or the
    /// line could not be allocated.
    pub fn insert_line_after(&mut self, at: LineId, text: &[u8]) -> Option<LineId> {
        if !self.lines.in_ring(at) {
            return None;
        }
        let copy = try_copy(text).ok()?;
        let id = self.lines.alloc(Line::real(copy)).ok()?;
        self.lines.link_after(at, id)?;
        self.record_insert(id);
        self.modified = true;
        Some(id)
    }

    /// Insert a new line before `at`.
    pub fn insert_line_before(&mut self, at: LineId, text: &[u8]) -> Option<LineId> {
        if !self.lines.is_live(at) {
            return None;
        }
        let prev = self.lines.prev(at)?;
        self.insert_line_after(prev, text)
    }

    /// Delete a line. Anchors on it move to the next line (or the previous
    /// one at the end of the buffer), at its first non-blank column.
    pub fn delete_line(&mut self, id: LineId) -> bool {
        if !self.lines.is_live(id) {
            return false;
        }
        if self.lines.len() == 1 {
            return self.set_line(id, b"");
        }

        self.record_delete(id);
        let landing = self.history.dot(Direction::Forward);
        self.history.set_dot(Direction::Forward, None);
        if self.lines.is_live(id) {
            self.lines.unlink(id);
            self.lines.free(id);
        }
        if let Some(landing) = landing {
            self.windows.relocate(id, landing);
        }
        self.modified = true;
        true
    }

    /// Replace the whole content of a line.
    pub fn set_line(&mut self, id: LineId, text: &[u8]) -> bool {
        if !self.lines.is_live(id) {
            return false;
        }
        let Ok(copy) = try_copy(text) else {
            return false;
        };
        self.record_modify(id);
        let Some(line) = self.lines.get_mut(id) else {
            return false;
        };
        line.text = copy;
        self.windows.clamp_line(id, text.len());
        self.modified = true;
        true
    }

    /// Insert bytes at an anchor. The column is clamped to the line.
    pub fn insert_text(&mut self, at: Anchor, text: &[u8]) -> bool {
        if text.is_empty() || !self.lines.is_live(at.line) {
            return false;
        }
        self.record_modify(at.line);
        let Some(line) = self.lines.get_mut(at.line) else {
            return false;
        };
        let col = at.col.min(line.len());
        if line.text.try_reserve(text.len()).is_err() {
            return false;
        }
        line.text.extend_from_slice(text);
        line.text[col..].rotate_right(text.len());
        self.modified = true;
        true
    }

    pub fn insert_char(&mut self, at: Anchor, ch: char) -> bool {
        let mut buf = [0; 4];
        self.insert_text(at, ch.encode_utf8(&mut buf).as_bytes())
    }

    /// Delete up to `len` bytes starting at an anchor. Returns false if
    /// there was nothing to delete.
    pub fn delete_text(&mut self, at: Anchor, len: usize) -> bool {
        let Some(line_len) = self.line(at.line).map(<[u8]>::len) else {
            return false;
        };
        let end = at.col.saturating_add(len).min(line_len);
        if at.col >= end {
            return false;
        }
        self.record_modify(at.line);
        let Some(line) = self.lines.get_mut(at.line) else {
            return false;
        };
        line.text.drain(at.col..end);
        let len = line.len();
        self.windows.clamp_line(at.line, len);
        self.modified = true;
        true
    }

    /// Break a line in two at an anchor. The text from the column on moves
    /// to a new line below, and so do anchors at or past the column.
    pub fn split_line(&mut self, at: Anchor) -> Option<LineId> {
        let text = self.line(at.line)?;
        let col = at.col.min(text.len());
        let tail = try_copy(&text[col..]).ok()?;
        let new = self.lines.alloc(Line::real(tail)).ok()?;

        self.record_modify(at.line);
        if let Some(line) = self.lines.get_mut(at.line) {
            line.text.truncate(col);
        }
        self.lines.link_after(at.line, new)?;
        self.record_insert(new);
        self.windows.split(at.line, col, new);
        self.modified = true;
        Some(new)
    }

    /// Append the next line to `id` and delete it. Anchors on the next line
    /// move onto `id`, shifted past the old end.
    pub fn join_lines(&mut self, id: LineId) -> bool {
        if !self.lines.is_live(id) {
            return false;
        }
        let Some(next) = self.lines.next(id).filter(|&n| self.lines.is_live(n)) else {
            return false;
        };
        let Some(tail) = self.line(next).and_then(|text| try_copy(text).ok()) else {
            return false;
        };
        let Some(old_len) = self.line(id).map(<[u8]>::len) else {
            return false;
        };

        self.record_modify(id);
        let Some(line) = self.lines.get_mut(id) else {
            return false;
        };
        if line.text.try_reserve(tail.len()).is_err() {
            return false;
        }
        line.text.extend_from_slice(&tail);
        self.windows.shift(next, id, old_len);

        self.record_delete(next);
        self.history.set_dot(Direction::Forward, None);
        if self.lines.is_live(next) {
            self.lines.unlink(next);
            self.lines.free(next);
        }
        self.modified = true;
        true
    }

    /// `U`: put back the cursor line's content from before the latest run of
    /// edits on it. Undoable, so a second `U` swaps the edits back in.
    pub fn restore_line(&mut self) -> Outcome {
        let cursor = self.windows.cursor().line;
        let cached = self
            .history
            .restore
            .as_ref()
            .is_some_and(|cache| cache.line == cursor);
        if !cached || !self.lines.is_live(cursor) {
            self.history.restore = None;
            return Outcome::NothingToDo;
        }

        self.record_modify(cursor);
        let (Some(cache), Some(line)) = (self.history.restore.as_mut(), self.lines.get_mut(cursor))
        else {
            return Outcome::NothingToDo;
        };
        std::mem::swap(&mut line.text, &mut cache.text);
        let len = line.len();
        self.windows.clamp_line(cursor, len);
        self.modified = true;
        Outcome::Changed(1)
    }

    /// First line, column 0. Where anchors go when their line is gone and
    /// nothing better is known.
    pub(crate) fn fallback_anchor(&self) -> Anchor {
        Anchor::new(self.lines.first().unwrap_or_else(|| self.lines.head()), 0)
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("lines", &self.line_count())
            .field("undo", &self.undo_count())
            .field("redo", &self.redo_count())
            .field("modified", &self.modified)
            .field("line_ending", &self.line_ending)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    fn anchor(buf: &Buffer, line: usize, col: usize) -> Anchor {
        buf.anchor_at(pos(line, col)).unwrap()
    }

    // -- LineEnding ---------------------------------------------------------

    #[test]
    fn line_ending_detect() {
        assert_eq!(LineEnding::detect("hello\nworld\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("hello\r\nworld\r\n"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("hello\rworld\r"), LineEnding::Cr);
        assert_eq!(LineEnding::detect("no newlines"), LineEnding::Lf);
        assert_eq!(LineEnding::detect(""), LineEnding::Lf);
    }

    #[test]
    fn line_ending_detect_first_wins() {
        assert_eq!(LineEnding::detect("a\nb\r\nc"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb\nc"), LineEnding::CrLf);
    }

    #[test]
    fn line_ending_as_str_and_display() {
        assert_eq!(LineEnding::CrLf.as_str(), "\r\n");
        assert_eq!(LineEnding::Cr.as_str(), "\r");
        assert_eq!(format!("{}", LineEnding::CrLf), "CRLF");
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_buffer_has_one_empty_line() {
        let buf = Buffer::new();
        assert_eq!(buf.lines(), vec![String::new()]);
        assert!(!buf.is_modified());
        assert_eq!(buf.undo_count(), 0);
        assert_eq!(buf.cursor_position(), Position::ZERO);
        assert_eq!(buf.audit(), Ok(()));
    }

    #[test]
    fn from_text_splits_on_every_ending() {
        let buf = Buffer::from_text("a\nb\r\nc\rd");
        assert_eq!(buf.lines(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn trailing_ending_does_not_open_a_line() {
        let buf = Buffer::from_text("abc\ndef\n");
        assert_eq!(buf.lines(), vec!["abc", "def"]);
        assert_eq!(Buffer::from_text("\n").lines(), vec![String::new()]);
        assert_eq!(Buffer::from_text("a\n\n").lines(), vec!["a", ""]);
    }

    #[test]
    fn contents_joins_with_detected_ending() {
        let buf = Buffer::from_text("one\r\ntwo\r\n");
        assert_eq!(buf.line_ending(), LineEnding::CrLf);
        assert_eq!(buf.contents(), "one\r\ntwo");
    }

    #[test]
    fn lines_get_sequence_numbers() {
        let buf = Buffer::from_text("a\nb");
        let a = buf.line_id(0).unwrap();
        let b = buf.line_id(1).unwrap();
        assert!(buf.store().get(a).unwrap().seq() < buf.store().get(b).unwrap().seq());
    }

    // -- Positions ----------------------------------------------------------

    #[test]
    fn anchor_at_clamps_column() {
        let buf = Buffer::from_text("abc\nde");
        let a = buf.anchor_at(pos(1, 10)).unwrap();
        assert_eq!(buf.position_of(a), Some(pos(1, 2)));
        assert_eq!(buf.anchor_at(pos(2, 0)), None);
    }

    #[test]
    fn set_cursor_rejects_missing_line() {
        let mut buf = Buffer::from_text("abc\nde");
        assert!(buf.set_cursor(pos(1, 1)));
        assert_eq!(buf.cursor_position(), pos(1, 1));
        assert!(!buf.set_cursor(pos(5, 0)));
        assert_eq!(buf.cursor_position(), pos(1, 1));
    }

    #[test]
    fn named_marks_resolve_to_positions() {
        let mut buf = Buffer::from_text("abc\nde");
        assert!(buf.set_named_mark('a', pos(1, 1)));
        assert_eq!(buf.named_mark('a'), Some(pos(1, 1)));
        assert!(!buf.set_named_mark('A', pos(1, 1)));
    }

    // -- Editing ------------------------------------------------------------

    #[test]
    fn insert_line_after_and_before() {
        let mut buf = Buffer::from_text("b");
        let b = buf.line_id(0).unwrap();
        buf.insert_line_after(b, b"c").unwrap();
        buf.insert_line_before(b, b"a").unwrap();
        let head = buf.store().head();
        buf.insert_line_after(head, b"top").unwrap();
        assert_eq!(buf.lines(), vec!["top", "a", "b", "c"]);
        assert!(buf.is_modified());
        assert_eq!(buf.audit(), Ok(()));
    }

    #[test]
    fn delete_line_moves_cursor_to_first_non_blank() {
        let mut buf = Buffer::from_text("abc\n   def\nghi");
        buf.set_cursor(pos(0, 2));
        let first = buf.line_id(0).unwrap();
        assert!(buf.delete_line(first));
        assert_eq!(buf.lines(), vec!["   def", "ghi"]);
        assert_eq!(buf.cursor_position(), pos(0, 3));
    }

    #[test]
    fn delete_last_line_lands_on_previous() {
        let mut buf = Buffer::from_text("  abc\ndef");
        buf.set_cursor(pos(1, 1));
        let last = buf.line_id(1).unwrap();
        assert!(buf.delete_line(last));
        assert_eq!(buf.cursor_position(), pos(0, 2));
    }

    #[test]
    fn delete_only_line_empties_it() {
        let mut buf = Buffer::from_text("abc");
        let only = buf.line_id(0).unwrap();
        assert!(buf.delete_line(only));
        assert_eq!(buf.lines(), vec![String::new()]);
        assert_eq!(buf.line_count(), 1);
        assert!(buf.is_modified());
    }

    #[test]
    fn set_line_clamps_anchors() {
        let mut buf = Buffer::from_text("hello");
        buf.set_cursor(pos(0, 4));
        let id = buf.line_id(0).unwrap();
        assert!(buf.set_line(id, b"hi"));
        assert_eq!(buf.lines(), vec!["hi"]);
        assert_eq!(buf.cursor_position(), pos(0, 2));
    }

    #[test]
    fn insert_and_delete_text() {
        let mut buf = Buffer::from_text("hello");
        let at = anchor(&buf, 0, 2);
        assert!(buf.insert_text(at, b"XY"));
        assert_eq!(buf.lines(), vec!["heXYllo"]);
        assert!(buf.insert_char(anchor(&buf, 0, 7), '!'));
        assert_eq!(buf.lines(), vec!["heXYllo!"]);
        assert!(buf.delete_text(anchor(&buf, 0, 2), 2));
        assert_eq!(buf.lines(), vec!["hello!"]);
        assert!(!buf.delete_text(anchor(&buf, 0, 6), 3));
    }

    #[test]
    fn insert_char_multibyte() {
        let mut buf = Buffer::from_text("cafe");
        buf.insert_char(anchor(&buf, 0, 4), 'é');
        assert_eq!(buf.lines(), vec!["cafeé"]);
        assert_eq!(buf.line_at(0).unwrap().len(), 6);
    }

    #[test]
    fn split_line_moves_tail_and_cursor() {
        let mut buf = Buffer::from_text("hello world");
        buf.set_cursor(pos(0, 8));
        let new = buf.split_line(anchor(&buf, 0, 5)).unwrap();
        assert_eq!(buf.lines(), vec!["hello", " world"]);
        assert_eq!(buf.line(new), Some(&b" world"[..]));
        assert_eq!(buf.cursor_position(), pos(1, 3));
        assert_eq!(buf.audit(), Ok(()));
    }

    #[test]
    fn join_lines_shifts_anchors() {
        let mut buf = Buffer::from_text("abc\ndef\nghi");
        buf.set_cursor(pos(1, 1));
        let first = buf.line_id(0).unwrap();
        assert!(buf.join_lines(first));
        assert_eq!(buf.lines(), vec!["abcdef", "ghi"]);
        assert_eq!(buf.cursor_position(), pos(0, 4));
        let last = buf.line_id(1).unwrap();
        assert!(!buf.join_lines(last));
        assert_eq!(buf.audit(), Ok(()));
    }

    #[test]
    fn edits_on_dead_lines_are_refused() {
        let mut buf = Buffer::from_text("a\nb");
        let a = buf.line_id(0).unwrap();
        buf.delete_line(a);
        assert!(!buf.set_line(a, b"x"));
        assert!(!buf.delete_line(a));
        assert!(buf.insert_line_after(a, b"x").is_none());
        assert!(!buf.insert_text(Anchor::new(a, 0), b"x"));
    }

    // -- Restore line -------------------------------------------------------

    #[test]
    fn restore_line_swaps_back_and_forth() {
        let mut buf = Buffer::from_text("abc\nz");
        let a = buf.line_id(0).unwrap();
        buf.mark_burst_start();
        buf.set_line(a, b"x");

        buf.mark_burst_start();
        assert_eq!(buf.restore_line(), Outcome::Changed(1));
        assert_eq!(buf.lines(), vec!["abc", "z"]);
        buf.mark_burst_start();
        assert_eq!(buf.restore_line(), Outcome::Changed(1));
        assert_eq!(buf.lines(), vec!["x", "z"]);
        assert_eq!(buf.audit(), Ok(()));
    }

    #[test]
    fn restore_line_is_undoable() {
        let mut buf = Buffer::from_text("abc\nz");
        let a = buf.line_id(0).unwrap();
        buf.mark_burst_start();
        buf.set_line(a, b"x");
        buf.mark_burst_start();
        buf.restore_line();

        assert_eq!(buf.undo_step(), Outcome::Changed(1));
        assert_eq!(buf.lines(), vec!["x", "z"]);
        assert_eq!(buf.restore_line(), Outcome::NothingToDo);
    }

    #[test]
    fn restore_line_needs_cursor_on_edited_line() {
        let mut buf = Buffer::from_text("abc\nz");
        let a = buf.line_id(0).unwrap();
        buf.mark_burst_start();
        buf.set_line(a, b"x");
        buf.set_cursor(pos(1, 0));
        buf.mark_burst_start();
        buf.set_cursor(pos(0, 0));
        assert_eq!(buf.restore_line(), Outcome::NothingToDo);
        assert_eq!(buf.lines(), vec!["x", "z"]);
    }

    // -- Metadata -----------------------------------------------------------

    #[test]
    fn mark_saved_clears_modified() {
        let mut buf = Buffer::from_text("a");
        buf.set_line(buf.line_id(0).unwrap(), b"b");
        assert!(buf.is_modified());
        buf.mark_saved();
        assert!(!buf.is_modified());
        buf.mark_modified();
        assert!(buf.is_modified());
    }

    #[test]
    fn debug_shows_counts() {
        let buf = Buffer::from_text("a\nb");
        let dbg = format!("{buf:?}");
        assert!(dbg.contains("lines: 2"));
        assert!(dbg.contains("undo: 0"));
    }
}
