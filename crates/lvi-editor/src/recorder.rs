//! Change recorder: the three hooks editing primitives call before they
//! touch the ring.
//!
//! | Hook              | Called                      | Pushes on Back                |
//! |-------------------|-----------------------------|-------------------------------|
//! | `record_delete`   | before a line is unlinked   | the line itself               |
//! | `record_modify`   | before a line's text changes | a copy, then a Patch          |
//! | `record_insert`   | after a line is linked in   | a Placeholder for its gap     |
//!
//! Each hook opens the command's batch on first use. None of them report
//! failure: if the history cannot allocate, the change is logged, the buffer
//! is marked modified without hope of returning to clean, and the primitive
//! goes ahead anyway.

use tracing::{trace, warn};

use crate::buffer::Buffer;
use crate::error::{HistoryError, Inconsistency};
use crate::history::{Direction, RestoreCache};
use crate::line::{Line, LineId, LineKind, Links};
use crate::position::Anchor;
use crate::store::try_copy;

impl Buffer {
    /// `id` is about to leave the ring. Moves it onto the Back stack,
    /// remembering its gap, and stores where the cursor should land.
    ///
    /// If `id` is still live afterwards the change could not be recorded and
    /// the caller removes the line itself.
    pub fn record_delete(&mut self, id: LineId) {
        let Some(landing) = self.landing_for(id) else {
            return;
        };
        self.history.set_dot(Direction::Forward, Some(landing));
        if let Err(err) = self.capture_delete(id) {
            self.unrecorded(err, id);
        }
    }

    /// `id` is about to have its text changed in place. The first time in a
    /// burst, saves a copy of the current text. Later calls in the same burst
    /// do nothing.
    pub fn record_modify(&mut self, id: LineId) {
        if !self.lines.is_live(id) {
            return;
        }
        if let Err(err) = self.ensure_burst() {
            self.unrecorded(err, id);
            return;
        }
        if self
            .lines
            .get(id)
            .is_some_and(|line| line.copied == self.history.generation)
        {
            return;
        }
        self.remember_for_restore(id);
        if let Err(err) = self.capture_modify(id) {
            self.unrecorded(err, id);
        }
    }

    /// `id` was just linked into the ring. Pushes a placeholder for the gap
    /// it now fills, so undo can take it out again.
    pub fn record_insert(&mut self, id: LineId) {
        if !self.lines.is_live(id) {
            return;
        }
        if let Err(err) = self.capture_insert(id) {
            self.unrecorded(err, id);
        }
    }

    // -- Capture ------------------------------------------------------------

    fn capture_delete(&mut self, id: LineId) -> Result<(), HistoryError> {
        self.ensure_burst()?;
        let (prev, next) = self
            .lines
            .unlink(id)
            .ok_or(Inconsistency::StaleHandle(id))?;
        let line = self
            .lines
            .get_mut(id)
            .ok_or(Inconsistency::StaleHandle(id))?;
        line.kind = LineKind::Real;
        line.links = Links::Stacked {
            prev,
            next,
            below: None,
        };
        self.history.push(&mut self.lines, Direction::Back, id);
        trace!(line = ?id, ?prev, ?next, "recorded delete");
        Ok(())
    }

    fn capture_modify(&mut self, id: LineId) -> Result<(), HistoryError> {
        let line = self.lines.get(id).ok_or(Inconsistency::StaleHandle(id))?;
        let Links::Live { prev, next } = line.links() else {
            return Err(Inconsistency::StaleHandle(id).into());
        };
        let copy = try_copy(line.text())?;

        let duplicate = self.lines.alloc(Line::stacked(copy, prev, next))?;
        let patch = match self.lines.alloc(Line::patch(id, duplicate)) {
            Ok(patch) => patch,
            Err(err) => {
                self.lines.free(duplicate);
                return Err(err);
            }
        };
        self.history.push(&mut self.lines, Direction::Back, duplicate);
        self.history.push(&mut self.lines, Direction::Back, patch);
        self.stamp(id);
        trace!(line = ?id, ?duplicate, "recorded modify");
        Ok(())
    }

    fn capture_insert(&mut self, id: LineId) -> Result<(), HistoryError> {
        self.ensure_burst()?;
        let (Some(prev), Some(next)) = (self.lines.prev(id), self.lines.next(id)) else {
            return Err(Inconsistency::StaleHandle(id).into());
        };
        let placeholder = self.lines.alloc(Line::placeholder(prev, next))?;
        self.history
            .push(&mut self.lines, Direction::Back, placeholder);
        // The whole line goes away on undo, so later edits to it in this
        // burst need no copy.
        self.stamp(id);
        trace!(line = ?id, ?placeholder, "recorded insert");
        Ok(())
    }

    // -- Helpers ------------------------------------------------------------

    fn stamp(&mut self, id: LineId) {
        let generation = self.history.generation;
        if let Some(line) = self.lines.get_mut(id) {
            line.copied = generation;
        }
    }

    /// Where the cursor goes once `id` is deleted: the next line, or the
    /// previous one at the end of the buffer, at its first non-blank.
    fn landing_for(&self, id: LineId) -> Option<Anchor> {
        if !self.lines.is_live(id) {
            return None;
        }
        let head = self.lines.head();
        let next = self.lines.next(id)?;
        let prev = self.lines.prev(id)?;
        let to = if next != head {
            next
        } else if prev != head {
            prev
        } else {
            return None;
        };
        let col = self.lines.get(to)?.first_non_blank();
        Some(Anchor::new(to, col))
    }

    /// Keep the pre-edit text of `id` for `U`, unless it is already kept.
    fn remember_for_restore(&mut self, id: LineId) {
        if self
            .history
            .restore
            .as_ref()
            .is_some_and(|cache| cache.line == id)
        {
            return;
        }
        self.history.restore = self
            .lines
            .get(id)
            .and_then(|line| try_copy(line.text()).ok())
            .map(|text| RestoreCache { line: id, text });
    }

    fn unrecorded(&mut self, err: HistoryError, id: LineId) {
        warn!(%err, line = ?id, "change will not be undoable");
        self.note_unrecorded_change();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
