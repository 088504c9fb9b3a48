//! Line records: the unit of storage shared by the ring and both undo stacks.
//!
//! Every record in a [`LineStore`](crate::store::LineStore) is a [`Line`]. What
//! a record *is* comes from its [`LineKind`]; where it currently *lives* comes
//! from its [`Links`]:
//!
//! | Links       | Kinds                     | Meaning                              |
//! |-------------|---------------------------|--------------------------------------|
//! | `Live`      | `Real`                    | In the ring, between `prev` and `next` |
//! | `Stacked`   | `Real`, `Placeholder`     | On a stack; remembers its ring gap   |
//! | `Patch`     | `Patch`                   | On a stack; `original` → `duplicate` |
//! | `Separator` | `Separator`, `PureSeparator` | Batch boundary with saved cursor  |
//! | `Detached`  | any                       | Freshly allocated or just unlinked   |
//!
//! A record is in exactly one of these places at a time. Moving it (ring to
//! stack, stack to ring) rewrites its `Links`; nothing ever holds two roles.

use std::fmt;

use crate::position::Anchor;

// ---------------------------------------------------------------------------
// LineId
// ---------------------------------------------------------------------------

/// Stable handle to a record in a line store.
///
/// Handles are generational: once a record is freed its slot may be reused,
/// but the old handle stops resolving instead of aliasing the new record.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId {
    index: u32,
    generation: u32,
}

impl LineId {
    #[inline]
    #[must_use]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub(crate) const fn raw_index(self) -> u32 {
        self.index
    }

    #[inline]
    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}.{}", self.index, self.generation)
    }
}

// ---------------------------------------------------------------------------
// LineKind
// ---------------------------------------------------------------------------

/// What a record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// A line of text, live or saved on a stack.
    Real,
    /// Stands for "no line here": replaying it removes whatever occupies its gap.
    Placeholder,
    /// Batch boundary.
    Separator,
    /// Batch boundary for a batch that began on an unmodified buffer.
    PureSeparator,
    /// Retargets older stack entries from a modified line to its pre-edit copy.
    Patch,
}

impl LineKind {
    /// True for both separator flavours.
    #[inline]
    #[must_use]
    pub const fn is_separator(self) -> bool {
        matches!(self, Self::Separator | Self::PureSeparator)
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// The role-specific links of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Links {
    /// Member of the live ring.
    Live { prev: LineId, next: LineId },

    /// Line or placeholder on a stack. `prev`/`next` name the ring gap it was
    /// taken from (or must be put back into); `below` is the next entry down.
    Stacked {
        prev: LineId,
        next: LineId,
        below: Option<LineId>,
    },

    /// `original` was content-modified in place; `duplicate` (further down the
    /// same stack) holds its earlier content.
    Patch {
        original: LineId,
        duplicate: LineId,
        below: Option<LineId>,
    },

    /// Batch boundary. `dot` is the cursor to restore when the batch is
    /// replayed. `older`/`newer` chain the separators of one stack together so
    /// the oldest batch can be cut off without walking the stack.
    Separator {
        dot: Anchor,
        below: Option<LineId>,
        older: Option<LineId>,
        newer: Option<LineId>,
    },

    /// Not linked anywhere yet (or any more).
    Detached,
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// One record: a line of text or a piece of stack bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub(crate) text: Vec<u8>,
    pub(crate) seq: Option<u64>,
    pub(crate) copied: u32,
    pub(crate) kind: LineKind,
    pub(crate) links: Links,
}

impl Line {
    // -- Construction -------------------------------------------------------

    pub(crate) const fn real(text: Vec<u8>) -> Self {
        Self {
            text,
            seq: None,
            copied: 0,
            kind: LineKind::Real,
            links: Links::Detached,
        }
    }

    /// A saved copy of a line that sat between `prev` and `next`.
    pub(crate) const fn stacked(text: Vec<u8>, prev: LineId, next: LineId) -> Self {
        Self {
            text,
            seq: None,
            copied: 0,
            kind: LineKind::Real,
            links: Links::Stacked {
                prev,
                next,
                below: None,
            },
        }
    }

    pub(crate) const fn placeholder(prev: LineId, next: LineId) -> Self {
        Self {
            text: Vec::new(),
            seq: None,
            copied: 0,
            kind: LineKind::Placeholder,
            links: Links::Stacked {
                prev,
                next,
                below: None,
            },
        }
    }

    pub(crate) const fn patch(original: LineId, duplicate: LineId) -> Self {
        Self {
            text: Vec::new(),
            seq: None,
            copied: 0,
            kind: LineKind::Patch,
            links: Links::Patch {
                original,
                duplicate,
                below: None,
            },
        }
    }

    pub(crate) const fn separator(dot: Anchor, pure: bool) -> Self {
        Self {
            text: Vec::new(),
            seq: None,
            copied: 0,
            kind: if pure {
                LineKind::PureSeparator
            } else {
                LineKind::Separator
            },
            links: Links::Separator {
                dot,
                below: None,
                older: None,
                newer: None,
            },
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// The line's bytes. Empty for bookkeeping records.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Used length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True for an empty line.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Allocated size in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.text.capacity()
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> LineKind {
        self.kind
    }

    /// Creation sequence number. Assigned to real lines when they are
    /// allocated; `None` for bookkeeping records and the ring sentinel.
    #[inline]
    #[must_use]
    pub const fn seq(&self) -> Option<u64> {
        self.seq
    }

    #[inline]
    #[must_use]
    pub const fn links(&self) -> Links {
        self.links
    }

    /// Byte offset of the first character that is not a space or tab.
    /// Equals the length for a blank line.
    #[must_use]
    pub fn first_non_blank(&self) -> usize {
        self.text
            .iter()
            .take_while(|b| matches!(b, b' ' | b'\t'))
            .count()
    }

    // -- Stack links --------------------------------------------------------

    /// The next entry down, for records on a stack.
    pub(crate) const fn below(&self) -> Option<LineId> {
        match self.links {
            Links::Stacked { below, .. }
            | Links::Patch { below, .. }
            | Links::Separator { below, .. } => below,
            Links::Live { .. } | Links::Detached => None,
        }
    }

    /// Set the next entry down. A no-op for records that cannot be stacked in
    /// their current role.
    pub(crate) const fn set_below(&mut self, entry: Option<LineId>) {
        match &mut self.links {
            Links::Stacked { below, .. }
            | Links::Patch { below, .. }
            | Links::Separator { below, .. } => *below = entry,
            Links::Live { .. } | Links::Detached => {}
        }
    }

    pub(crate) const fn older(&self) -> Option<LineId> {
        match self.links {
            Links::Separator { older, .. } => older,
            _ => None,
        }
    }

    pub(crate) const fn newer(&self) -> Option<LineId> {
        match self.links {
            Links::Separator { newer, .. } => newer,
            _ => None,
        }
    }

    pub(crate) const fn set_older(&mut self, id: Option<LineId>) {
        if let Links::Separator { older, .. } = &mut self.links {
            *older = id;
        }
    }

    pub(crate) const fn set_newer(&mut self, id: Option<LineId>) {
        if let Links::Separator { newer, .. } = &mut self.links {
            *newer = id;
        }
    }

    /// Rewrite every recorded reference to `from` so it names `to` instead.
    /// Returns true if anything changed.
    pub(crate) fn retarget(&mut self, from: LineId, to: LineId) -> bool {
        let mut changed = false;
        let mut swap = |id: &mut LineId| {
            if *id == from {
                *id = to;
                changed = true;
            }
        };
        match &mut self.links {
            Links::Stacked { prev, next, .. } => {
                swap(prev);
                swap(next);
            }
            Links::Patch { original, .. } => swap(original),
            Links::Separator { dot, .. } => swap(&mut dot.line),
            Links::Live { .. } | Links::Detached => {}
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
