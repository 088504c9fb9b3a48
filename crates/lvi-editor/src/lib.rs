//! # lvi-editor: Line store and change history for lvi
//!
//! This crate holds a buffer's text and everything needed to undo it:
//!
//! - **[`position`]**: numeric `Position` and the weak `Anchor` (line handle + byte offset)
//! - **[`line`]**: `LineId` handles and the `Line` record shared by ring and stacks
//! - **[`store`]**: `LineStore`, the record arena and its sentinel-headed ring
//! - **[`history`]**: the Back and Forward stacks and their bookkeeping
//! - **[`recorder`]**: `record_delete` / `record_modify` / `record_insert`
//! - **[`replay`]**: `undo_step`, `redo_step`, `toggle_direction`
//! - **[`burst`]**: per-command batch boundaries and depth trimming
//! - **[`window`]**: window cursors, marks, and named marks that replay repairs
//! - **[`buffer`]**: `Buffer`, tying it all together behind editing primitives
//! - **[`options`]**: `:set undolevels` / `:set modified`
//! - **[`error`]**: `HistoryError`, `Inconsistency`, and the user-facing `Outcome`
//!
//! Rendering, file I/O and command dispatch live elsewhere. They drive this
//! crate through `Buffer`: `mark_burst_start` before each command, the
//! editing primitives during it, and the replay commands for `u` and `^R`.

pub mod buffer;
pub mod burst;
pub mod error;
pub mod history;
pub mod line;
pub mod options;
pub mod position;
pub mod recorder;
pub mod replay;
pub mod store;
pub mod window;
