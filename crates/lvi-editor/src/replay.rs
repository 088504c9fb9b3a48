//! Replay: undo and redo.
//!
//! Replaying pops one batch from a stack and applies each entry to the ring.
//! Every entry remembers the gap `(prev, next)` it belongs in, and the swap
//! it performs pushes whatever it displaced onto the *opposite* stack with
//! the same gap, so replaying that stack later puts everything back:
//!
//! | Popped        | Gap holds   | Ring after          | Pushed on opposite  |
//! |---------------|-------------|---------------------|---------------------|
//! | Real `L`      | one line `O` | `L` in place of `O` | `O`                 |
//! | Real `L`      | nothing     | `L` in the gap      | Placeholder         |
//! | Placeholder   | one line `O` | gap emptied         | `O`                 |
//! | Placeholder   | nothing     | unchanged           | the placeholder     |
//! | Patch         | (n/a)       | unchanged           | (n/a)               |
//! | Separator     | (n/a)       | unchanged           | (stops the replay)  |
//!
//! A gap that holds more than one line, or whose ends are no longer in the
//! ring, is refused: the entry goes back on its stack and the replay stops
//! with an internal error. Entries already replayed stay replayed; the
//! opposite stack was given its separator first, so it stays well formed.

use tracing::{debug, error, trace};

use crate::buffer::Buffer;
use crate::error::{HistoryError, Inconsistency, Outcome};
use crate::history::Direction;
use crate::line::{Line, LineId, LineKind, Links};
use crate::window::Fate;

impl Buffer {
    // -- Commands -----------------------------------------------------------

    /// Undo: replay one batch from the stack the direction flag selects.
    pub fn undo_step(&mut self) -> Outcome {
        self.step(self.history.direction)
    }

    /// Redo: replay one batch from the Forward stack.
    pub fn redo_step(&mut self) -> Outcome {
        self.step(Direction::Forward)
    }

    /// vi-style `u`: replay one batch from the stack the direction flag
    /// selects (or the other one, if that is empty), then point the flag the
    /// other way. Repeating it walks back and forth between two states.
    pub fn toggle_direction(&mut self) -> Outcome {
        let mut from = self.history.direction;
        let mut outcome = self.step(from);
        if outcome == Outcome::NothingToDo {
            from = from.opposite();
            outcome = self.step(from);
        }
        if outcome.is_changed() {
            self.history.direction = from.opposite();
        }
        outcome
    }

    fn step(&mut self, from: Direction) -> Outcome {
        match self.replay(from) {
            Ok(changed) => Outcome::Changed(changed),
            Err(HistoryError::NoHistory) => Outcome::NothingToDo,
            Err(err) => {
                error!(%err, ?from, "replay stopped");
                Outcome::InternalError
            }
        }
    }

    // -- Worker -------------------------------------------------------------

    fn replay(&mut self, from: Direction) -> Result<usize, HistoryError> {
        if self.history.is_empty(from) {
            return Err(HistoryError::NoHistory);
        }
        let to = from.opposite();
        let was_modified = self.modified;
        self.history.burst_open = false;
        self.history.restore = None;

        let before = self.windows.cursor();
        self.history
            .push_separator(&mut self.lines, to, before, !was_modified)?;
        if to == Direction::Back {
            self.history.trim(&mut self.lines);
        }

        let mut changed = 0;
        let result = loop {
            let Some(id) = self.history.pop(&mut self.lines, from) else {
                break Err(Inconsistency::Unterminated.into());
            };
            let Some(kind) = self.lines.get(id).map(Line::kind) else {
                break Err(Inconsistency::StaleHandle(id).into());
            };
            match kind {
                LineKind::Separator | LineKind::PureSeparator => {
                    self.close_batch(id, kind);
                    break Ok(changed);
                }
                LineKind::Patch => self.apply_patch(id, from),
                LineKind::Real | LineKind::Placeholder => match self.swap_in(id, to) {
                    Ok(n) => changed += n,
                    Err(err) => {
                        self.history.push(&mut self.lines, from, id);
                        break Err(err);
                    }
                },
            }
        };

        let fallback = self.fallback_anchor();
        self.windows.normalize(&self.lines, fallback);
        match result {
            Ok(changed) => {
                debug!(?from, changed, "replayed batch");
                Ok(changed)
            }
            Err(err) => {
                if changed > 0 {
                    self.note_unrecorded_change();
                }
                Err(err)
            }
        }
    }

    /// The batch's separator was reached: put the cursor where the batch
    /// started and take the modified flag from the separator's purity.
    fn close_batch(&mut self, separator: LineId, kind: LineKind) {
        if let Some(Links::Separator { dot, .. }) = self.lines.get(separator).map(Line::links) {
            if let Some(line) = self.lines.get(dot.line).filter(|_| self.lines.is_live(dot.line)) {
                self.windows.set_cursor(dot.clamped(line.len()));
            }
        }
        self.lines.free(separator);
        self.modified = kind != LineKind::PureSeparator;
    }

    /// Older entries of this stack that name the patched line must name its
    /// pre-edit copy instead, since that copy is what they were recorded
    /// against.
    fn apply_patch(&mut self, patch: LineId, from: Direction) {
        if let Some(Links::Patch {
            original,
            duplicate,
            ..
        }) = self.lines.get(patch).map(Line::links)
        {
            let retargeted = self
                .history
                .retarget(&mut self.lines, from, original, duplicate);
            trace!(?original, ?duplicate, retargeted, "applied patch");
        }
        self.lines.free(patch);
    }

    /// Put a popped Real or Placeholder entry back into its gap.
    fn swap_in(&mut self, id: LineId, to: Direction) -> Result<usize, HistoryError> {
        let entry = self.lines.get(id).ok_or(Inconsistency::StaleHandle(id))?;
        let kind = entry.kind();
        let Links::Stacked { prev, next, .. } = entry.links() else {
            return Err(Inconsistency::WrongRole(id).into());
        };
        let occupant = self.gap_occupant(id, prev, next)?;

        match (kind, occupant) {
            (LineKind::Real, Some(old)) => {
                self.lines
                    .replace(old, id)
                    .ok_or(Inconsistency::StaleHandle(old))?;
                self.stack_line(old, prev, next, to);
                self.windows
                    .repair(&self.lines, old, Fate::Replaced(id));
                Ok(1)
            }
            (LineKind::Real, None) => {
                let placeholder = self.lines.alloc(Line::placeholder(prev, next))?;
                if self.lines.link_after(prev, id).is_none() {
                    self.lines.free(placeholder);
                    return Err(Inconsistency::LostBoundary(prev).into());
                }
                self.history.push(&mut self.lines, to, placeholder);
                Ok(1)
            }
            (LineKind::Placeholder, Some(old)) => {
                self.lines
                    .unlink(old)
                    .ok_or(Inconsistency::StaleHandle(old))?;
                self.stack_line(old, prev, next, to);
                let head = self.lines.head();
                let successor = if next == head { prev } else { next };
                self.windows
                    .repair(&self.lines, old, Fate::Removed(successor));
                self.lines.free(id);
                Ok(1)
            }
            (LineKind::Placeholder, None) => {
                self.history.push(&mut self.lines, to, id);
                Ok(0)
            }
            _ => Err(Inconsistency::WrongRole(id).into()),
        }
    }

    /// A line that just left the ring goes on `to`, remembering its gap.
    fn stack_line(&mut self, id: LineId, prev: LineId, next: LineId, to: Direction) {
        if let Some(line) = self.lines.get_mut(id) {
            line.kind = LineKind::Real;
            line.links = Links::Stacked {
                prev,
                next,
                below: None,
            };
        }
        self.history.push(&mut self.lines, to, id);
    }

    /// The single line between `prev` and `next`, if any.
    ///
    /// # Errors
    ///
    /// [`Inconsistency::LostBoundary`] if either end is not in the ring or
    /// `next` does not follow `prev`; [`Inconsistency::CrowdedGap`] if more
    /// than one line sits between them.
    fn gap_occupant(
        &self,
        entry: LineId,
        prev: LineId,
        next: LineId,
    ) -> Result<Option<LineId>, Inconsistency> {
        for end in [prev, next] {
            if !self.lines.in_ring(end) {
                return Err(Inconsistency::LostBoundary(end));
            }
        }
        let head = self.lines.head();
        let first = self.lines.next(prev).ok_or(Inconsistency::LostBoundary(prev))?;
        if first == next {
            return Ok(None);
        }

        let mut occupants = 0;
        let mut at = first;
        while at != next {
            // Walking past the head means `next` never followed `prev`.
            if at == head {
                return Err(Inconsistency::LostBoundary(next));
            }
            occupants += 1;
            at = self.lines.next(at).ok_or(Inconsistency::LostBoundary(at))?;
        }
        match occupants {
            1 => Ok(Some(first)),
            _ => Err(Inconsistency::CrowdedGap { entry, occupants }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
