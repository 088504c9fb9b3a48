//! Undo/redo history: two stacks of line records.
//!
//! History is not a list of text diffs. Each stack is a singly linked chain of
//! records taken from the same [`LineStore`] as the live ring:
//!
//! - a **Real** entry is a whole line that was removed from the ring (or a
//!   pre-edit copy of one), remembering the ring gap it belongs in;
//! - a **Placeholder** entry says "this gap held nothing";
//! - a **Patch** entry says "older entries that name `original` should name
//!   `duplicate` by the time they are replayed";
//! - a **Separator** closes a batch (one user command) and carries the cursor
//!   to restore.
//!
//! ```text
//! Back stack (top first)                 Forward stack
//! ┌───────────────────────────┐          ┌──────────────┐
//! │ Patch{X → X'}             │          │ (cleared by  │
//! │ Real X' (gap P..N)        │ batch 2  │  every new   │
//! │ Placeholder (gap X..N)    │          │  burst)      │
//! │ Separator(dot)            │          └──────────────┘
//! │ Real Y (gap P..X)         │ batch 1
//! │ PureSeparator(dot)        │
//! └───────────────────────────┘
//! ```
//!
//! Replaying a batch pops entries until it pops the batch's separator, and
//! swaps each popped entry with the ring's current occupant of its gap; the
//! occupant goes onto the *opposite* stack. That is what makes every replay
//! exactly reversible. The replay worker lives in [`crate::replay`]; this
//! module only owns the stack bookkeeping.
//!
//! Separators on each stack are additionally chained oldest ⇄ newest, so the
//! depth limit can cut off the oldest batch without walking from the top.

use crate::error::HistoryError;
use crate::line::{Line, LineId, LineKind};
use crate::position::Anchor;
use crate::store::LineStore;

/// Default cap on the number of batches kept on the Back stack.
pub const DEFAULT_UNDO_LEVELS: usize = 1000;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Which stack an operation reads.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The undo stack.
    #[default]
    Back,
    /// The redo stack.
    Forward,
}

impl Direction {
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Back => Self::Forward,
            Self::Forward => Self::Back,
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::Back => 0,
            Self::Forward => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

/// Head and batch bookkeeping of one stack.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stack {
    pub(crate) top: Option<LineId>,
    pub(crate) batches: usize,
    /// Bottom-most separator.
    pub(crate) oldest: Option<LineId>,
    /// Separator of the top batch.
    pub(crate) newest: Option<LineId>,
}

/// Cached pre-edit copy of the line most recently edited, for `U`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RestoreCache {
    pub(crate) line: LineId,
    pub(crate) text: Vec<u8>,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Per-buffer change history.
#[derive(Debug)]
pub struct History {
    pub(crate) stacks: [Stack; 2],
    /// `Back`: cursor snapshot taken before the current command.
    /// `Forward`: where the cursor lands after the line being deleted is gone.
    pub(crate) dots: [Option<Anchor>; 2],
    /// Cookie value meaning "copied during the current burst". Never zero.
    pub(crate) generation: u32,
    /// True once the current command has started its batch.
    pub(crate) burst_open: bool,
    /// Stack popped by [`Buffer::undo_step`](crate::buffer::Buffer::undo_step).
    pub(crate) direction: Direction,
    /// Maximum batches on the Back stack. At least 1.
    pub(crate) limit: usize,
    pub(crate) restore: Option<RestoreCache>,
}

impl History {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            stacks: [Stack::default(); 2],
            dots: [None; 2],
            generation: 1,
            burst_open: false,
            direction: Direction::Back,
            limit: limit.max(1),
            restore: None,
        }
    }

    #[inline]
    pub(crate) const fn stack(&self, dir: Direction) -> &Stack {
        &self.stacks[dir.index()]
    }

    #[inline]
    pub(crate) const fn stack_mut(&mut self, dir: Direction) -> &mut Stack {
        &mut self.stacks[dir.index()]
    }

    #[inline]
    pub(crate) const fn dot(&self, dir: Direction) -> Option<Anchor> {
        self.dots[dir.index()]
    }

    #[inline]
    pub(crate) const fn set_dot(&mut self, dir: Direction, dot: Option<Anchor>) {
        self.dots[dir.index()] = dot;
    }

    /// Number of batches on a stack.
    #[inline]
    #[must_use]
    pub const fn batches(&self, dir: Direction) -> usize {
        self.stack(dir).batches
    }

    /// True if the stack has nothing to replay.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self, dir: Direction) -> bool {
        self.stack(dir).top.is_none()
    }

    #[inline]
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    // -- Push / pop ---------------------------------------------------------

    /// Put a record that is already in a stack role on top of `dir`.
    pub(crate) fn push(&mut self, store: &mut LineStore, dir: Direction, id: LineId) -> Option<()> {
        let below = self.stack(dir).top;
        store.get_mut(id)?.set_below(below);
        self.stack_mut(dir).top = Some(id);
        Some(())
    }

    /// Allocate a batch separator and push it on `dir`.
    ///
    /// # Errors
    ///
    /// [`HistoryError::OutOfMemory`] if the separator cannot be allocated; the
    /// stack is left as it was.
    pub(crate) fn push_separator(
        &mut self,
        store: &mut LineStore,
        dir: Direction,
        dot: Anchor,
        pure: bool,
    ) -> Result<LineId, HistoryError> {
        let id = store.alloc(Line::separator(dot, pure))?;
        let newest = self.stack(dir).newest;
        if let Some(sep) = store.get_mut(id) {
            sep.set_older(newest);
        }
        if let Some(prev) = newest.and_then(|prev| store.get_mut(prev)) {
            prev.set_newer(Some(id));
        }
        self.push(store, dir, id);

        let stack = self.stack_mut(dir);
        stack.newest = Some(id);
        if stack.oldest.is_none() {
            stack.oldest = Some(id);
        }
        stack.batches += 1;
        Ok(id)
    }

    /// Take the top record off `dir`. Popping a separator closes its batch.
    pub(crate) fn pop(&mut self, store: &mut LineStore, dir: Direction) -> Option<LineId> {
        let id = self.stack(dir).top?;
        let line = store.get_mut(id)?;
        let below = line.below();
        line.set_below(None);
        let older = line.kind().is_separator().then(|| line.older());
        line.set_older(None);

        self.stack_mut(dir).top = below;
        if let Some(older) = older {
            let stack = self.stack_mut(dir);
            stack.batches = stack.batches.saturating_sub(1);
            stack.newest = older;
            match older.and_then(|sep| store.get_mut(sep)) {
                Some(sep) => sep.set_newer(None),
                None => self.stack_mut(dir).oldest = None,
            }
        }
        Some(id)
    }

    /// Free every record on `dir`. Returns how many were freed.
    pub(crate) fn discard(&mut self, store: &mut LineStore, dir: Direction) -> usize {
        let mut freed = 0;
        let mut at = self.stack(dir).top;
        while let Some(id) = at {
            at = store.get(id).and_then(Line::below);
            if store.free(id).is_some() {
                freed += 1;
            }
        }
        *self.stack_mut(dir) = Stack::default();
        freed
    }

    // -- Walking ------------------------------------------------------------

    /// Records on `dir`, top first.
    pub(crate) fn entries<'a>(&self, store: &'a LineStore, dir: Direction) -> Entries<'a> {
        Entries {
            store,
            at: self.stack(dir).top,
        }
    }

    /// Point every entry on `dir` that names `from` at `to` instead.
    /// Returns how many entries changed.
    pub(crate) fn retarget(
        &self,
        store: &mut LineStore,
        dir: Direction,
        from: LineId,
        to: LineId,
    ) -> usize {
        let mut changed = 0;
        let mut at = self.stack(dir).top;
        while let Some(id) = at {
            let Some(entry) = store.get_mut(id) else {
                break;
            };
            if entry.retarget(from, to) {
                changed += 1;
            }
            at = entry.below();
        }
        changed
    }

    /// Turn every pure separator on both stacks into an ordinary one.
    pub(crate) fn downgrade_pure(&self, store: &mut LineStore) -> usize {
        let mut downgraded = 0;
        for dir in [Direction::Back, Direction::Forward] {
            let mut at = self.stack(dir).top;
            while let Some(id) = at {
                let Some(entry) = store.get_mut(id) else {
                    break;
                };
                if entry.kind == LineKind::PureSeparator {
                    entry.kind = LineKind::Separator;
                    downgraded += 1;
                }
                at = entry.below();
            }
        }
        downgraded
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LEVELS)
    }
}

/// Iterator over one stack's records, top first.
#[derive(Debug, Clone)]
pub(crate) struct Entries<'a> {
    store: &'a LineStore,
    at: Option<LineId>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = (LineId, &'a Line);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.at?;
        let line = self.store.get(id)?;
        self.at = line.below();
        Some((id, line))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
