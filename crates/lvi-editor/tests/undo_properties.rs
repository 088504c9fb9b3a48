//! Property-based tests for the undo engine.
//!
//! These tests drive a `Buffer` with random edit sequences and check:
//!
//! 1. Undoing every batch walks back through the exact earlier states
//! 2. Redoing them walks forward again, to the exact final state
//! 3. Undo then redo is an identity, however often repeated
//! 4. A typing burst undoes in one step, cursor included
//! 5. Deleting N lines and undoing restores them in place
//! 6. Repeated edits to one line in a burst copy it once
//! 7. A new edit after an undo leaves nothing to redo
//! 8. A depth limit of K allows exactly K undos
//! 9. Ownership stays consistent throughout

use lvi_editor::buffer::Buffer;
use lvi_editor::error::Outcome;
use lvi_editor::history::Direction;
use lvi_editor::line::LineKind;
use lvi_editor::position::Position;
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

/// One step of a user command, applied at the active cursor.
#[derive(Debug, Clone)]
enum Op {
    Cursor(usize, usize),
    InsertChar(char),
    InsertLine(String),
    DeleteLine,
    SetLine(String),
    DeleteText(usize),
    Split,
    Join,
    Restore,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..8, 0usize..8).prop_map(|(line, col)| Op::Cursor(line, col)),
        proptest::char::range('a', 'e').prop_map(Op::InsertChar),
        "[a-c ]{0,4}".prop_map(Op::InsertLine),
        Just(Op::DeleteLine),
        "[a-c ]{0,4}".prop_map(Op::SetLine),
        (1usize..4).prop_map(Op::DeleteText),
        Just(Op::Split),
        Just(Op::Join),
        Just(Op::Restore),
    ]
}

/// A list of commands, each a short list of steps.
fn bursts_strategy() -> impl Strategy<Value = Vec<Vec<Op>>> {
    prop::collection::vec(prop::collection::vec(op_strategy(), 1..5), 1..16)
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-d ]{0,5}", 1..7).prop_map(|lines| lines.join("\n"))
}

// ── Helpers ─────────────────────────────────────────────────────────────

type State = (Vec<String>, Position);

fn state(buf: &Buffer) -> State {
    (buf.lines(), buf.cursor_position())
}

fn apply(buf: &mut Buffer, op: &Op) {
    let cursor = buf.cursor();
    match op {
        Op::Cursor(line, col) => {
            let line = line % buf.line_count();
            buf.set_cursor(Position::new(line, *col));
        }
        Op::InsertChar(ch) => {
            buf.insert_char(cursor, *ch);
        }
        Op::InsertLine(text) => {
            buf.insert_line_after(cursor.line, text.as_bytes());
        }
        Op::DeleteLine => {
            buf.delete_line(cursor.line);
        }
        Op::SetLine(text) => {
            buf.set_line(cursor.line, text.as_bytes());
        }
        Op::DeleteText(n) => {
            buf.delete_text(cursor, *n);
        }
        Op::Split => {
            buf.split_line(cursor);
        }
        Op::Join => {
            buf.join_lines(cursor.line);
        }
        Op::Restore => {
            buf.restore_line();
        }
    }
}

/// Run every command. Returns the state just before each command that left
/// an undo batch behind.
fn run(buf: &mut Buffer, bursts: &[Vec<Op>]) -> Vec<State> {
    let mut states = Vec::new();
    for burst in bursts {
        let before = state(buf);
        let batches = buf.undo_count();
        buf.mark_burst_start();
        for op in burst {
            apply(buf, op);
        }
        if buf.undo_count() > batches {
            states.push(before);
        }
    }
    states
}

// ═══════════════════════════════════════════════════════════════════════
// 1–2. Undo walks back through every state; redo walks forward again
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn undo_and_redo_visit_every_state(
        text in text_strategy(),
        bursts in bursts_strategy(),
    ) {
        let mut buf = Buffer::from_text(&text);
        let states = run(&mut buf, &bursts);
        prop_assert_eq!(buf.audit(), Ok(()));
        let last = state(&buf);

        for expected in states.iter().rev() {
            prop_assert!(buf.undo_step().is_changed());
            prop_assert_eq!(&state(&buf), expected);
            prop_assert_eq!(buf.audit(), Ok(()));
        }
        prop_assert_eq!(buf.undo_step(), Outcome::NothingToDo);
        prop_assert!(!buf.is_modified(), "fully undone buffer must be clean");

        // With no batch recorded there is nothing to redo either.
        let forward: Vec<State> = states
            .iter()
            .skip(1)
            .cloned()
            .chain(std::iter::once(last).filter(|_| !states.is_empty()))
            .collect();
        for expected in &forward {
            prop_assert!(buf.redo_step().is_changed());
            prop_assert_eq!(&state(&buf), expected);
            prop_assert_eq!(buf.audit(), Ok(()));
        }
        prop_assert_eq!(buf.redo_step(), Outcome::NothingToDo);
    }
}

proptest! {
    #[test]
    fn commands_without_changes_leave_nothing_to_replay(
        text in "[a-d]{0,5}",
        joins in 1usize..4,
    ) {
        let mut buf = Buffer::from_text(&text);
        let before = state(&buf);
        let bursts = vec![vec![Op::Join]; joins];
        prop_assert!(run(&mut buf, &bursts).is_empty());

        prop_assert_eq!(buf.undo_step(), Outcome::NothingToDo);
        prop_assert_eq!(buf.redo_step(), Outcome::NothingToDo);
        prop_assert_eq!(state(&buf), before);
        prop_assert!(!buf.is_modified());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Undo then redo is an identity
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn undo_redo_round_trips(
        text in text_strategy(),
        bursts in bursts_strategy(),
        rounds in 1usize..5,
    ) {
        let mut buf = Buffer::from_text(&text);
        run(&mut buf, &bursts);
        let after = state(&buf);
        let modified = buf.is_modified();

        for _ in 0..rounds {
            buf.undo_step();
            buf.redo_step();
            prop_assert_eq!(&state(&buf), &after);
            prop_assert_eq!(buf.is_modified(), modified);
        }
        prop_assert_eq!(buf.audit(), Ok(()));
    }

    #[test]
    fn toggle_twice_round_trips(
        text in text_strategy(),
        bursts in bursts_strategy(),
    ) {
        let mut buf = Buffer::from_text(&text);
        run(&mut buf, &bursts);
        let after = state(&buf);
        buf.toggle_direction();
        buf.toggle_direction();
        prop_assert_eq!(state(&buf), after);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. A typing burst undoes in one step
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn typing_burst_undoes_in_one_step(
        text in text_strategy(),
        col in 0usize..8,
        typed in "[a-z]{1,12}",
    ) {
        let mut buf = Buffer::from_text(&text);
        buf.set_cursor(Position::new(0, col));
        let before = state(&buf);

        buf.mark_burst_start();
        for ch in typed.chars() {
            let at = buf.cursor();
            buf.insert_char(at, ch);
            let next = buf.cursor_position().col + 1;
            buf.set_cursor(Position::new(0, next));
        }

        prop_assert_eq!(buf.undo_step(), Outcome::Changed(1));
        prop_assert_eq!(state(&buf), before);
        prop_assert!(!buf.is_modified());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5. Deleting N lines and undoing restores them in place
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn deleted_lines_come_back_in_place(
        text in text_strategy(),
        start in 0usize..8,
        n in 0usize..8,
    ) {
        let mut buf = Buffer::from_text(&text);
        let count = buf.line_count();
        let start = start % count;
        let n = 1 + n % (count - start);
        buf.set_cursor(Position::new(start, 0));
        let before = state(&buf);

        buf.mark_burst_start();
        for _ in 0..n {
            let id = buf.line_id(start).unwrap();
            prop_assert!(buf.delete_line(id));
        }

        prop_assert_eq!(buf.undo_step(), Outcome::Changed(n));
        prop_assert_eq!(state(&buf), before);
        prop_assert_eq!(buf.audit(), Ok(()));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 6. Repeated edits to one line in a burst copy it once
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_edits_copy_once(
        text in text_strategy(),
        edits in prop::collection::vec("[a-z]{0,6}", 1..10),
    ) {
        let mut buf = Buffer::from_text(&text);
        let original = buf.lines();
        buf.mark_burst_start();
        let id = buf.line_id(0).unwrap();
        for edit in &edits {
            buf.set_line(id, edit.as_bytes());
        }

        let reals = buf
            .stacked_kinds(Direction::Back)
            .into_iter()
            .filter(|&kind| kind == LineKind::Real)
            .count();
        prop_assert_eq!(reals, 1);
        buf.undo_step();
        prop_assert_eq!(buf.lines(), original);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 7. A new edit after an undo leaves nothing to redo
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn new_edit_clears_redo(
        text in text_strategy(),
        bursts in bursts_strategy(),
        replacement in "[a-z]{1,4}",
    ) {
        let mut buf = Buffer::from_text(&text);
        run(&mut buf, &bursts);
        buf.undo_step();

        buf.mark_burst_start();
        let id = buf.line_id(0).unwrap();
        buf.set_line(id, replacement.as_bytes());
        prop_assert_eq!(buf.redo_step(), Outcome::NothingToDo);
        prop_assert_eq!(buf.redo_count(), 0);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 8. A depth limit of K allows exactly K undos
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn depth_limit_caps_undo(k in 1usize..8, extra in 0usize..8) {
        let mut buf = Buffer::new();
        buf.set_undo_limit(k);
        for i in 0..k + extra {
            buf.mark_burst_start();
            let id = buf.line_id(0).unwrap();
            buf.set_line(id, i.to_string().as_bytes());
        }
        prop_assert_eq!(buf.undo_count(), k);

        let mut undone = 0;
        while buf.undo_step().is_changed() {
            undone += 1;
            prop_assert!(undone <= k, "undid more than {} batches", k);
        }
        prop_assert_eq!(undone, k);

        let oldest_kept = if extra == 0 { String::new() } else { (extra - 1).to_string() };
        prop_assert_eq!(buf.lines(), vec![oldest_kept]);
        prop_assert_eq!(buf.audit(), Ok(()));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 9. Ownership stays consistent under mixed undo, redo and edits
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn interleaved_replay_keeps_ownership(
        text in text_strategy(),
        bursts in bursts_strategy(),
        replays in prop::collection::vec(0u8..3, 1..12),
    ) {
        let mut buf = Buffer::from_text(&text);
        for (burst, replay) in bursts.iter().zip(replays.iter().cycle()) {
            buf.mark_burst_start();
            for op in burst {
                apply(&mut buf, op);
            }
            match replay {
                0 => {}
                1 => {
                    buf.undo_step();
                }
                _ => {
                    buf.redo_step();
                }
            }
            prop_assert_eq!(buf.audit(), Ok(()));
            prop_assert!(buf.line_count() >= 1);
            prop_assert!(buf.store().is_live(buf.cursor().line));
        }
    }
}
