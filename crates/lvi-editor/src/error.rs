//! Error and outcome types for the change-history engine.
//!
//! Recording never fails loudly: an [`HistoryError::OutOfMemory`] is handled
//! where the change is recorded and only makes that change non-undoable.
//! Replay reports an [`Inconsistency`] instead of guessing, and the user-facing
//! result of every undo command is an [`Outcome`].

use std::fmt;

use thiserror::Error;

use crate::history::Direction;
use crate::line::LineId;

/// Why a replay refused to touch the live ring.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Inconsistency {
    /// The gap a stacked entry came from holds more than one line.
    #[error("gap recorded by {entry:?} holds {occupants} lines")]
    CrowdedGap { entry: LineId, occupants: usize },

    /// One end of a recorded gap is no longer in the live ring.
    #[error("gap boundary {0:?} is not in the live ring")]
    LostBoundary(LineId),

    /// A handle points at a freed or reused record.
    #[error("stale line handle {0:?}")]
    StaleHandle(LineId),

    /// A stack ran out before its batch separator was reached.
    #[error("undo batch has no separator")]
    Unterminated,

    /// A record is reachable from two places at once.
    #[error("record {0:?} is owned twice")]
    Shared(LineId),

    /// A record's kind does not match the links it carries.
    #[error("record {0:?} has links that do not fit its kind")]
    WrongRole(LineId),

    /// The separators found on a stack disagree with its batch count.
    #[error("stack holds {counted} batches but records {recorded}")]
    BatchCount { counted: usize, recorded: usize },

    /// Allocated records that neither the ring nor a stack owns.
    #[error("{0} records are owned by nothing")]
    Orphaned(usize),
}

/// Failures inside the Line Store and change history.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("out of memory while recording a change")]
    OutOfMemory,

    #[error("undo history is inconsistent: {0}")]
    Inconsistent(#[from] Inconsistency),

    /// The selected stack is empty. Not a fault, shown as "nothing to do".
    #[error("no history in that direction")]
    NoHistory,
}

/// Result of a user-level undo, redo or line-restore command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran; this many lines were swapped, inserted or removed.
    Changed(usize),
    /// Nothing to undo, redo or restore.
    NothingToDo,
    /// Replay found an inconsistent gap and stopped. Already replayed entries
    /// stay replayed; the rest of the stack is untouched.
    InternalError,
}

impl Outcome {
    /// True unless the command was a no-op or failed.
    #[inline]
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed(_))
    }

    /// Status-line text for a replay from `from`. Unlike `Display`, an empty
    /// stack is reported by name: "Nothing to undo" or "Nothing to redo".
    #[must_use]
    pub fn message(self, from: Direction) -> String {
        match (self, from) {
            (Self::NothingToDo, Direction::Back) => "Nothing to undo".to_string(),
            (Self::NothingToDo, Direction::Forward) => "Nothing to redo".to_string(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Changed(1) => f.write_str("1 line changed"),
            Self::Changed(n) => write!(f, "{n} lines changed"),
            Self::NothingToDo => f.write_str("Nothing to do"),
            Self::InternalError => f.write_str("Internal error: undo history is inconsistent"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
