//! Line store: an arena of line records threaded into a circular ring.
//!
//! Records live in a slot arena and are addressed by generational
//! [`LineId`]s. The live document is a doubly linked ring that starts and ends
//! at a sentinel head record:
//!
//! ```text
//!        ┌──────────────────────────────────────────┐
//!        ▼                                          │
//!     [head] ⇄ "fn main() {" ⇄ "    todo!()" ⇄ "}" ─┘
//! ```
//!
//! Walks stop when they arrive back at the head; callers compare against
//! [`head`](LineStore::head) rather than looking for a null link. Insertion and
//! removal at a known position are O(1). The store knows nothing about undo:
//! the history layer moves records between the ring and its stacks through
//! [`unlink`](LineStore::unlink), [`link_after`](LineStore::link_after) and
//! [`replace`](LineStore::replace).

use crate::error::HistoryError;
use crate::line::{Line, LineId, LineKind, Links};

#[derive(Debug)]
struct Slot {
    generation: u32,
    line: Option<Line>,
}

/// Arena of line records plus the live ring.
#[derive(Debug)]
pub struct LineStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: LineId,
    live: usize,
    next_seq: u64,
    /// Number of allocations allowed before `alloc` reports out-of-memory.
    #[cfg(test)]
    pub(crate) alloc_budget: Option<usize>,
}

impl LineStore {
    /// An empty ring: just the sentinel head, linked to itself.
    #[must_use]
    pub fn new() -> Self {
        let head = LineId::new(0, 0);
        let mut sentinel = Line::real(Vec::new());
        sentinel.links = Links::Live {
            prev: head,
            next: head,
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                line: Some(sentinel),
            }],
            free: Vec::new(),
            head,
            live: 0,
            next_seq: 0,
            #[cfg(test)]
            alloc_budget: None,
        }
    }

    // -- Records ------------------------------------------------------------

    /// The sentinel that starts and ends the ring.
    #[inline]
    #[must_use]
    pub const fn head(&self) -> LineId {
        self.head
    }

    /// Look up a record. `None` if the handle is stale.
    #[must_use]
    pub fn get(&self, id: LineId) -> Option<&Line> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.line.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: LineId) -> Option<&mut Line> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.line.as_mut()
    }

    /// Number of allocated records, including the sentinel and everything on
    /// the undo stacks.
    #[must_use]
    pub fn records(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Allocate a record. Real lines get the next sequence number.
    ///
    /// # Errors
    ///
    /// [`HistoryError::OutOfMemory`] if the arena cannot grow.
    pub(crate) fn alloc(&mut self, line: Line) -> Result<LineId, HistoryError> {
        #[cfg(test)]
        if let Some(budget) = self.alloc_budget.as_mut() {
            if *budget == 0 {
                return Err(HistoryError::OutOfMemory);
            }
            *budget -= 1;
        }

        if self.free.is_empty() {
            u32::try_from(self.slots.len()).map_err(|_| HistoryError::OutOfMemory)?;
            self.slots
                .try_reserve(1)
                .map_err(|_| HistoryError::OutOfMemory)?;
        }
        Ok(self.insert(line))
    }

    /// Append a line of loaded text to the end of the ring. Loading is not a
    /// recorded change, so it allocates like any other collection.
    pub(crate) fn append(&mut self, text: Vec<u8>) -> LineId {
        let id = self.insert(Line::real(text));
        let last = self.prev(self.head).unwrap_or(self.head);
        let linked = self.link_after(last, id);
        debug_assert!(linked.is_some(), "fresh line must link");
        id
    }

    fn insert(&mut self, mut line: Line) -> LineId {
        if line.kind == LineKind::Real {
            line.seq = Some(self.next_seq);
            self.next_seq += 1;
        }

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.line = Some(line);
            return LineId::new(index, slot.generation);
        }

        #[allow(clippy::cast_possible_truncation)]
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            line: Some(line),
        });
        LineId::new(index, 0)
    }

    /// Release a record that is no longer in the ring. The handle, and every
    /// copy of it, stops resolving. Returns the record, or `None` if the handle
    /// was stale, names the sentinel, or names a line still in the ring.
    pub(crate) fn free(&mut self, id: LineId) -> Option<Line> {
        if id == self.head || self.in_ring(id) {
            return None;
        }
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let line = slot.line.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.raw_index());
        Some(line)
    }

    /// Reset every record's copied-cookie to zero.
    pub(crate) fn clear_cookies(&mut self) {
        for line in self.slots.iter_mut().filter_map(|slot| slot.line.as_mut()) {
            line.copied = 0;
        }
    }

    // -- Ring queries -------------------------------------------------------

    /// True if `id` is in the ring, sentinel included.
    #[must_use]
    pub fn in_ring(&self, id: LineId) -> bool {
        matches!(self.get(id).map(Line::links), Some(Links::Live { .. }))
    }

    /// True if `id` is a line of the live document (the sentinel is not).
    #[must_use]
    pub fn is_live(&self, id: LineId) -> bool {
        id != self.head && self.in_ring(id)
    }

    /// Ring successor. Wraps to the sentinel after the last line.
    #[must_use]
    pub fn next(&self, id: LineId) -> Option<LineId> {
        match self.get(id)?.links {
            Links::Live { next, .. } => Some(next),
            _ => None,
        }
    }

    /// Ring predecessor. Wraps to the sentinel before the first line.
    #[must_use]
    pub fn prev(&self, id: LineId) -> Option<LineId> {
        match self.get(id)?.links {
            Links::Live { prev, .. } => Some(prev),
            _ => None,
        }
    }

    /// Number of live lines.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// True when the ring holds only the sentinel.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[must_use]
    pub fn first(&self) -> Option<LineId> {
        self.next(self.head).filter(|&id| id != self.head)
    }

    #[must_use]
    pub fn last(&self) -> Option<LineId> {
        self.prev(self.head).filter(|&id| id != self.head)
    }

    /// Live lines in document order.
    #[must_use]
    pub const fn iter(&self) -> Lines<'_> {
        Lines {
            store: self,
            at: self.head,
        }
    }

    /// The `n`th live line (0-indexed). O(n).
    #[must_use]
    pub fn nth(&self, n: usize) -> Option<LineId> {
        self.iter().nth(n)
    }

    /// Line number of a live line (0-indexed). O(n).
    #[must_use]
    pub fn index_of(&self, id: LineId) -> Option<usize> {
        self.iter().position(|line| line == id)
    }

    // -- Ring mutation ------------------------------------------------------

    fn set_next(&mut self, id: LineId, to: LineId) -> Option<()> {
        match &mut self.get_mut(id)?.links {
            Links::Live { next, .. } => {
                *next = to;
                Some(())
            }
            _ => None,
        }
    }

    fn set_prev(&mut self, id: LineId, to: LineId) -> Option<()> {
        match &mut self.get_mut(id)?.links {
            Links::Live { prev, .. } => {
                *prev = to;
                Some(())
            }
            _ => None,
        }
    }

    /// Link a record that is not in the ring directly after `at` (which may be
    /// the sentinel). Whatever role `id` had is replaced by `Live`.
    pub(crate) fn link_after(&mut self, at: LineId, id: LineId) -> Option<()> {
        if id == self.head || self.in_ring(id) {
            return None;
        }
        let next = self.next(at)?;
        self.get_mut(id)?.links = Links::Live { prev: at, next };
        self.set_next(at, id)?;
        self.set_prev(next, id)?;
        self.live += 1;
        Some(())
    }

    /// Take a live line out of the ring. It is left `Detached`; the returned
    /// pair is the gap it occupied.
    pub(crate) fn unlink(&mut self, id: LineId) -> Option<(LineId, LineId)> {
        if id == self.head {
            return None;
        }
        let Links::Live { prev, next } = self.get(id)?.links else {
            return None;
        };
        self.set_next(prev, next)?;
        self.set_prev(next, prev)?;
        self.get_mut(id)?.links = Links::Detached;
        self.live -= 1;
        Some((prev, next))
    }

    /// Put `new` where `old` is. `old` is left `Detached`; the returned pair is
    /// the gap both occupied.
    pub(crate) fn replace(&mut self, old: LineId, new: LineId) -> Option<(LineId, LineId)> {
        if new == self.head || self.get(new).is_none() || self.in_ring(new) {
            return None;
        }
        let (prev, next) = self.unlink(old)?;
        self.link_after(prev, new)?;
        Some((prev, next))
    }
}

/// Copy `bytes` into a new buffer, reporting allocation failure instead of
/// aborting.
///
/// # Errors
///
/// [`HistoryError::OutOfMemory`] if the buffer cannot be reserved.
pub(crate) fn try_copy(bytes: &[u8]) -> Result<Vec<u8>, HistoryError> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(bytes.len())
        .map_err(|_| HistoryError::OutOfMemory)?;
    copy.extend_from_slice(bytes);
    Ok(copy)
}

impl Default for LineStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Lines iterator
// ---------------------------------------------------------------------------

/// Iterator over the live ring, sentinel excluded.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    store: &'a LineStore,
    at: LineId,
}

impl Iterator for Lines<'_> {
    type Item = LineId;

    fn next(&mut self) -> Option<LineId> {
        let next = self.store.next(self.at)?;
        if next == self.store.head {
            return None;
        }
        self.at = next;
        Some(next)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
