//! Buffer options: the `:set` system for undo settings.
//!
//! Parses `:set` arguments into [`SetDirective`]s and applies them to a
//! [`Buffer`]. The undo depth lives on the buffer's history; the modified
//! flag is the buffer's own.
//!
//! # Supported syntax
//!
//! | Form           | Meaning                              |
//! |----------------|--------------------------------------|
//! | `:set mod`     | Turn a flag on (numbers: show value) |
//! | `:set nomod`   | Turn a flag off                      |
//! | `:set mod!`    | Flip a flag                          |
//! | `:set ul?`     | Report the value                     |
//! | `:set ul=N`    | Set a number                         |
//! | `:set`         | Report options off their default     |
//! | `:set all`     | Report every option                  |
//!
//! # Option names
//!
//! | Full name    | Abbrev | Type    | Default |
//! |--------------|--------|---------|---------|
//! | `undolevels` | `ul`   | integer | 1000    |
//! | `modified`   | `mod`  | bool    | false   |

use thiserror::Error;

use crate::buffer::Buffer;
use crate::history::DEFAULT_UNDO_LEVELS;

/// Undo configuration a buffer is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoOptions {
    /// Maximum number of undo batches kept. Zero is treated as one.
    pub undolevels: usize,
}

impl Default for UndoOptions {
    fn default() -> Self {
        Self {
            undolevels: DEFAULT_UNDO_LEVELS,
        }
    }
}

/// Why a `:set` argument was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("Unknown option: {0}")]
    Unknown(String),

    #[error("Invalid argument: {name}={value}")]
    InvalidNumber { name: String, value: String },

    /// `:set ul!` and friends.
    #[error("Not a boolean option: {0}")]
    NotBoolean(String),

    /// `:set mod=1` and friends.
    #[error("Not a numeric option: {0}")]
    NotNumeric(String),
}

/// One `:set` argument, as classified by [`parse_set_arg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    /// `:set option`: enable a boolean option.
    On(String),

    /// `:set nooption`: disable a boolean option.
    Off(String),

    /// `:set option!`: toggle a boolean option.
    Toggle(String),

    /// `:set option?`: query the current value.
    Query(String),

    /// `:set option=value`: assign a value.
    Assign(String, String),

    /// `:set` with no arguments: show changed options.
    ShowChanged,

    /// `:set all`: show all options.
    ShowAll,
}

/// Whether `name` (full or short) is a flag option.
#[must_use]
pub fn is_bool_option(name: &str) -> bool {
    matches!(name, "modified" | "mod")
}

/// Whether `name` (full or short) is a number option.
#[must_use]
pub fn is_numeric_option(name: &str) -> bool {
    matches!(name, "undolevels" | "ul")
}

/// Whether `name` names any option at all.
#[must_use]
pub fn is_known_option(name: &str) -> bool {
    is_bool_option(name) || is_numeric_option(name)
}

/// Split a `:set` argument line (`:set ul=50 nomod`) into directives. No
/// arguments at all means [`SetDirective::ShowChanged`].
#[must_use]
pub fn parse_set(args: &str) -> Vec<SetDirective> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return vec![SetDirective::ShowChanged];
    }
    trimmed.split_whitespace().map(parse_set_arg).collect()
}

/// Classify one whitespace-separated `:set` argument.
#[must_use]
pub fn parse_set_arg(arg: &str) -> SetDirective {
    if arg == "all" {
        return SetDirective::ShowAll;
    }

    if let Some((name, value)) = arg.split_once('=') {
        return SetDirective::Assign(name.to_string(), value.to_string());
    }

    if let Some(name) = arg.strip_suffix('?') {
        return SetDirective::Query(name.to_string());
    }

    if let Some(name) = arg.strip_suffix('!') {
        return SetDirective::Toggle(name.to_string());
    }

    // `no` only negates a known boolean, so an option whose name starts
    // with "no" still parses as itself.
    if let Some(name) = arg.strip_prefix("no") {
        if is_bool_option(name) {
            return SetDirective::Off(name.to_string());
        }
    }

    // A bare number option reports its value.
    if is_numeric_option(arg) {
        return SetDirective::Query(arg.to_string());
    }

    SetDirective::On(arg.to_string())
}

/// `name` or `noname`, the way `:set` reports a flag.
#[must_use]
pub fn format_bool(name: &str, value: bool) -> String {
    if value {
        name.to_string()
    } else {
        format!("no{name}")
    }
}

// ---------------------------------------------------------------------------
// Applying
// ---------------------------------------------------------------------------

/// Apply `:set` arguments to a buffer. Returns the lines the status area
/// should show, in order.
///
/// Directives before a rejected one have already been applied.
///
/// # Errors
///
/// The first argument that names an unknown option or misuses a known one.
pub fn apply_set(buf: &mut Buffer, args: &str) -> Result<Vec<String>, OptionError> {
    let mut shown = Vec::new();
    for directive in parse_set(args) {
        match directive {
            SetDirective::ShowChanged => {
                if buf.undo_limit() != DEFAULT_UNDO_LEVELS {
                    shown.push(show(buf, "undolevels"));
                }
                if buf.is_modified() {
                    shown.push(show(buf, "modified"));
                }
            }
            SetDirective::ShowAll => {
                shown.push(show(buf, "modified"));
                shown.push(show(buf, "undolevels"));
            }
            SetDirective::Query(name) => {
                known(&name)?;
                shown.push(show(buf, &name));
            }
            SetDirective::On(name) => {
                boolean(&name)?;
                buf.mark_modified();
            }
            SetDirective::Off(name) => {
                boolean(&name)?;
                buf.mark_saved();
            }
            SetDirective::Toggle(name) => {
                boolean(&name)?;
                if buf.is_modified() {
                    buf.mark_saved();
                } else {
                    buf.mark_modified();
                }
            }
            SetDirective::Assign(name, value) => {
                known(&name)?;
                if !is_numeric_option(&name) {
                    return Err(OptionError::NotNumeric(name));
                }
                let Ok(levels) = value.parse::<usize>() else {
                    return Err(OptionError::InvalidNumber { name, value });
                };
                buf.set_undo_limit(levels);
            }
        }
    }
    Ok(shown)
}

fn known(name: &str) -> Result<(), OptionError> {
    if is_known_option(name) {
        Ok(())
    } else {
        Err(OptionError::Unknown(name.to_string()))
    }
}

fn boolean(name: &str) -> Result<(), OptionError> {
    known(name)?;
    if is_bool_option(name) {
        Ok(())
    } else {
        Err(OptionError::NotBoolean(name.to_string()))
    }
}

/// `:set` display of one option's current value.
fn show(buf: &Buffer, name: &str) -> String {
    if is_bool_option(name) {
        format_bool("modified", buf.is_modified())
    } else {
        format!("undolevels={}", buf.undo_limit())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
