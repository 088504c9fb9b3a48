//! Burst cleanup and depth trimming.
//!
//! A burst is everything one user command changes. The dispatcher calls
//! [`Buffer::mark_burst_start`] before each command; nothing else happens
//! until the command records its first change, at which point
//! [`Buffer::ensure_burst`] opens the batch:
//!
//! 1. the Forward stack is thrown away (a new edit ends any redo chain),
//! 2. the copy generation advances, invalidating every line's cookie at once,
//! 3. a Back separator carrying the pre-command cursor is pushed,
//! 4. the Back stack is trimmed to the configured number of batches.
//!
//! Commands that change nothing never push a separator, so they never show
//! up as empty undo steps.

use tracing::debug;

use crate::buffer::Buffer;
use crate::error::HistoryError;
use crate::history::{Direction, History};
use crate::line::Line;
use crate::store::LineStore;

impl Buffer {
    /// A new user command is about to run. Snapshots the active cursor as the
    /// position undo will return to, and closes the previous batch.
    pub fn mark_burst_start(&mut self) {
        self.history.burst_open = false;
        let cursor = self.windows.cursor();
        self.history.set_dot(Direction::Back, Some(cursor));
        if self
            .history
            .restore
            .as_ref()
            .is_some_and(|cache| cache.line != cursor.line)
        {
            self.history.restore = None;
        }
    }

    /// Open the current command's batch if it is not open yet.
    pub(crate) fn ensure_burst(&mut self) -> Result<(), HistoryError> {
        if self.history.burst_open {
            return Ok(());
        }
        self.begin_burst()
    }

    fn begin_burst(&mut self) -> Result<(), HistoryError> {
        let discarded = self.history.discard(&mut self.lines, Direction::Forward);
        self.history.advance_generation(&mut self.lines);
        self.history.direction = Direction::Back;

        let dot = self
            .history
            .dot(Direction::Back)
            .filter(|dot| self.lines.is_live(dot.line))
            .unwrap_or_else(|| self.windows.cursor());
        self.history
            .push_separator(&mut self.lines, Direction::Back, dot, !self.modified)?;
        self.history.set_dot(Direction::Back, None);

        let trimmed = self.history.trim(&mut self.lines);
        self.history.burst_open = true;
        debug!(
            generation = self.history.generation,
            batches = self.history.batches(Direction::Back),
            discarded,
            trimmed,
            "burst started"
        );
        Ok(())
    }

    /// A change was made that the history could not record. The buffer is
    /// modified, and no undo can bring back the unmodified state any more.
    pub(crate) fn note_unrecorded_change(&mut self) {
        self.modified = true;
        self.history.downgrade_pure(&mut self.lines);
    }

    /// Change the maximum number of undo batches. Extra batches are dropped
    /// right away, oldest first. Zero is treated as one.
    pub fn set_undo_limit(&mut self, limit: usize) {
        self.history.limit = limit.max(1);
        self.history.trim(&mut self.lines);
    }

    #[inline]
    #[must_use]
    pub const fn undo_limit(&self) -> usize {
        self.history.limit()
    }
}

impl History {
    /// Free the oldest Back batches until at most `limit` remain. The newest
    /// batch is never dropped. Returns how many batches went.
    pub(crate) fn trim(&mut self, store: &mut LineStore) -> usize {
        let mut dropped = 0;
        while self.batches(Direction::Back) > self.limit {
            let Some(oldest) = self.stack(Direction::Back).oldest else {
                break;
            };
            let Some(survivor) = store.get(oldest).and_then(Line::newer) else {
                break;
            };

            // Everything below the survivor's separator belongs to the
            // oldest batch, its separator included.
            let mut at = store.get_mut(survivor).and_then(|sep| {
                let below = sep.below();
                sep.set_below(None);
                sep.set_older(None);
                below
            });
            while let Some(id) = at {
                at = store.get(id).and_then(Line::below);
                store.free(id);
            }

            let stack = self.stack_mut(Direction::Back);
            stack.oldest = Some(survivor);
            stack.batches -= 1;
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, limit = self.limit, "trimmed undo history");
        }
        dropped
    }

    /// Start a new copy generation. On wraparound every cookie is cleared so
    /// an old stamp cannot collide with the restarted counter.
    pub(crate) fn advance_generation(&mut self, store: &mut LineStore) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            store.clear_cookies();
            self.generation = 1;
            debug!("copy generation wrapped");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
