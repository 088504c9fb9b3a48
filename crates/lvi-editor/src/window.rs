//! Window anchors: the cursor and mark of every open window, plus the
//! buffer's named marks.
//!
//! The history engine does not manage windows; it only needs to know where
//! they point. Each window has a cursor and an optional mark (the `''`
//! position), both stored as [`Anchor`]s. Named marks `a`–`z` belong to the
//! buffer and follow the same rules.
//!
//! All of these are weak references. When replay swaps a line out of the
//! ring, [`Windows::repair`] repoints every anchor that named it: to the line
//! that took its place, or to the line after the gap when nothing did.

use crate::line::LineId;
use crate::position::Anchor;
use crate::store::LineStore;

/// Unique window identifier. Monotonically increasing, never reused.
pub type WinId = usize;

/// What happened to a line that left the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    /// Another line now occupies its ring position.
    Replaced(LineId),
    /// It is gone; anchors move to this line instead.
    Removed(LineId),
}

/// One window's position state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub id: WinId,
    pub cursor: Anchor,
    pub mark: Option<Anchor>,
}

/// All windows open on one buffer, and the buffer's named marks.
#[derive(Debug, Clone)]
pub struct Windows {
    list: Vec<Window>,
    /// Index into `list` of the window commands act on.
    active: usize,
    next_id: WinId,
    named: [Option<Anchor>; 26],
}

impl Windows {
    /// One window, active, with its cursor at `cursor`.
    #[must_use]
    pub fn new(cursor: Anchor) -> Self {
        Self {
            list: vec![Window {
                id: 0,
                cursor,
                mark: None,
            }],
            active: 0,
            next_id: 1,
            named: [None; 26],
        }
    }

    // -- Windows ------------------------------------------------------------

    /// Open another window with its cursor at `cursor`.
    pub fn open(&mut self, cursor: Anchor) -> WinId {
        let id = self.next_id;
        self.next_id += 1;
        self.list.push(Window {
            id,
            cursor,
            mark: None,
        });
        id
    }

    /// Close a window. The last window cannot be closed. If the active window
    /// closes, the previous one in opening order becomes active.
    pub fn close(&mut self, id: WinId) -> bool {
        if self.list.len() <= 1 {
            return false;
        }
        let Some(idx) = self.list.iter().position(|w| w.id == id) else {
            return false;
        };
        self.list.remove(idx);
        if self.active >= idx && self.active > 0 {
            self.active -= 1;
        }
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Never true: the last window cannot be closed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: WinId) -> Option<&Window> {
        self.list.iter().find(|w| w.id == id)
    }

    fn get_mut(&mut self, id: WinId) -> Option<&mut Window> {
        self.list.iter_mut().find(|w| w.id == id)
    }

    #[must_use]
    pub fn active(&self) -> WinId {
        self.list[self.active].id
    }

    /// Make `id` the active window.
    pub fn set_active(&mut self, id: WinId) -> bool {
        match self.list.iter().position(|w| w.id == id) {
            Some(idx) => {
                self.active = idx;
                true
            }
            None => false,
        }
    }

    /// Cursor of the active window.
    #[must_use]
    pub fn cursor(&self) -> Anchor {
        self.list[self.active].cursor
    }

    pub fn set_cursor(&mut self, cursor: Anchor) {
        self.list[self.active].cursor = cursor;
    }

    /// Set or clear the mark of a specific window.
    pub fn set_mark_of(&mut self, id: WinId, mark: Option<Anchor>) -> bool {
        self.get_mut(id).map(|w| w.mark = mark).is_some()
    }

    // -- Named marks --------------------------------------------------------

    /// Named mark `a`–`z`.
    #[must_use]
    pub fn named_mark(&self, name: char) -> Option<Anchor> {
        mark_index(name).and_then(|i| self.named[i])
    }

    /// Set named mark `a`–`z`. Returns false for any other name.
    pub fn set_named_mark(&mut self, name: char, at: Anchor) -> bool {
        mark_index(name).map(|i| self.named[i] = Some(at)).is_some()
    }

    // -- Repair -------------------------------------------------------------

    /// Every anchor: window cursors, window marks, named marks.
    fn anchors_mut(&mut self) -> impl Iterator<Item = &mut Anchor> {
        self.list
            .iter_mut()
            .flat_map(|w| std::iter::once(&mut w.cursor).chain(w.mark.as_mut()))
            .chain(self.named.iter_mut().flatten())
    }

    /// Repoint anchors on `gone` according to its fate. Columns are clamped to
    /// the new line's length.
    pub fn repair(&mut self, store: &LineStore, gone: LineId, fate: Fate) {
        let to = match fate {
            Fate::Replaced(id) | Fate::Removed(id) => id,
        };
        let len = store.get(to).map_or(0, |l| l.len());
        for anchor in self.anchors_mut().filter(|a| a.line == gone) {
            *anchor = Anchor::new(to, anchor.col).clamped(len);
        }
    }

    /// Move every anchor on `from` to exactly `to`.
    pub fn relocate(&mut self, from: LineId, to: Anchor) {
        for anchor in self.anchors_mut().filter(|a| a.line == from) {
            *anchor = to;
        }
    }

    /// Anchors on `line` at or past `col` follow the text split off onto
    /// `tail`.
    pub fn split(&mut self, line: LineId, col: usize, tail: LineId) {
        for anchor in self
            .anchors_mut()
            .filter(|a| a.line == line && a.col >= col)
        {
            *anchor = Anchor::new(tail, anchor.col - col);
        }
    }

    /// Move anchors on `from` to `to`, shifting their columns by `shift`.
    pub fn shift(&mut self, from: LineId, to: LineId, shift: usize) {
        for anchor in self.anchors_mut().filter(|a| a.line == from) {
            *anchor = Anchor::new(to, anchor.col + shift);
        }
    }

    /// Clamp anchors on `line` to `len`.
    pub fn clamp_line(&mut self, line: LineId, len: usize) {
        for anchor in self.anchors_mut().filter(|a| a.line == line) {
            *anchor = anchor.clamped(len);
        }
    }

    /// Send any anchor that does not name a live line to `fallback`, and clamp
    /// every column to its line's length.
    pub fn normalize(&mut self, store: &LineStore, fallback: Anchor) {
        for anchor in self.anchors_mut() {
            if !store.is_live(anchor.line) {
                *anchor = fallback;
            }
            let len = store.get(anchor.line).map_or(0, |l| l.len());
            *anchor = anchor.clamped(len);
        }
    }
}

fn mark_index(name: char) -> Option<usize> {
    name.is_ascii_lowercase()
        .then(|| (name as u8 - b'a') as usize)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
