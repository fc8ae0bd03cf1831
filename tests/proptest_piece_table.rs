//! Property-based tests for the piece table and edit history.
//!
//! A `ropey::Rope` fed the same edits serves as the reference model.

use proptest::prelude::*;
use ropey::Rope;
use textcore::{EditBuffer, Piece, PieceTable, Utf8Validator};

// ============================================================================
// Strategies
// ============================================================================

/// Short strings mixing ASCII, newlines and multi-byte characters.
fn edit_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!["a", "xyz", "\n", "é", "世", "😀", " ", "\r\n"]),
        0..6,
    )
    .prop_map(|parts| parts.concat())
}

#[derive(Clone, Debug)]
enum Op {
    /// Insert at a position chosen as a fraction of the current length.
    Insert(f64, String),
    /// Delete starting at a fraction of the length, spanning up to `n` chars.
    Delete(f64, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0.0..=1.0f64, edit_text()).prop_map(|(at, text)| Op::Insert(at, text)),
        2 => (0.0..=1.0f64, 0usize..8).prop_map(|(at, n)| Op::Delete(at, n)),
    ]
}

/// Char index to byte offset in `text`.
fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(i, _)| i)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn pick(fraction: f64, len: usize) -> usize {
    ((len as f64) * fraction) as usize
}

/// Apply `op` to both the buffer and the model rope.
fn apply(buf: &mut EditBuffer, model: &mut Rope, op: &Op) {
    let text = model.to_string();
    let chars = model.len_chars();
    match op {
        Op::Insert(at, insert) => {
            let char_idx = pick(*at, chars).min(chars);
            buf.insert(char_to_byte(&text, char_idx), insert).unwrap();
            model.insert(char_idx, insert);
        }
        Op::Delete(at, n) => {
            let start = pick(*at, chars).min(chars);
            let end = (start + n).min(chars);
            buf.delete(char_to_byte(&text, start)..char_to_byte(&text, end))
                .unwrap();
            model.remove(start..end);
        }
    }
}

fn assert_invariants(table: &PieceTable) -> Result<(), TestCaseError> {
    let sum: usize = table.pieces().iter().map(Piece::len).sum();
    prop_assert_eq!(sum, table.len());
    prop_assert!(table.pieces().iter().all(|p| !p.is_empty()));
    let all = table.slice(0..table.len()).unwrap();
    prop_assert!(std::str::from_utf8(&all).is_ok());
    prop_assert_eq!(table.line_count(), Utf8Validator::count_newlines(&all) + 1);
    Ok(())
}

// ============================================================================
// Piece Table Properties
// ============================================================================

proptest! {
    /// Inserted text reads back from the offset it was inserted at.
    #[test]
    fn insert_round_trips(base in edit_text(), at in 0.0..=1.0f64, text in edit_text()) {
        let mut table = PieceTable::from_text(&base);
        let offset = char_to_byte(&base, pick(at, base.chars().count()));
        table.insert(offset, &text).unwrap();
        let read = table.slice(offset..offset + text.len()).unwrap();
        prop_assert_eq!(read.as_ref(), text.as_bytes());
    }

    /// Any sequence of edits matches the rope model and keeps the table
    /// consistent.
    #[test]
    fn edits_match_rope_model(base in edit_text(), ops in prop::collection::vec(op(), 0..40)) {
        let mut buf = EditBuffer::with_text(&base);
        let mut model = Rope::from_str(&base);
        for op in &ops {
            apply(&mut buf, &mut model, op);
            assert_invariants(buf.table())?;
        }
        let expected = model.to_string();
        prop_assert_eq!(buf.text(), expected.clone());

        // Only `\n` ends a line; ropey also breaks on a lone `\r`, so lines
        // are checked against the model text directly.
        let lines: Vec<&str> = expected.split('\n').collect();
        prop_assert_eq!(buf.line_count(), lines.len());
        for (line, text) in lines.iter().enumerate() {
            prop_assert_eq!(buf.table().line_text(line).unwrap(), *text);
        }
    }

    /// Segments of any valid range concatenate to the range's bytes.
    #[test]
    fn segments_concatenate_to_slice(
        ops in prop::collection::vec(op(), 1..20),
        from in 0.0..=1.0f64,
        to in 0.0..=1.0f64,
    ) {
        let mut buf = EditBuffer::new();
        let mut model = Rope::new();
        for op in &ops {
            apply(&mut buf, &mut model, op);
        }
        let len = buf.len();
        let (a, b) = (pick(from, len), pick(to, len));
        let range = a.min(b)..a.max(b);
        let joined: Vec<u8> = buf.iterate(range.clone()).unwrap().flatten().copied().collect();
        let sliced = buf.slice(range).unwrap();
        prop_assert_eq!(&joined[..], sliced.as_ref());
    }

    /// offset_to_line_column and line_column_to_offset are inverse.
    #[test]
    fn line_column_round_trips(ops in prop::collection::vec(op(), 1..20), stride in 1usize..5) {
        let mut buf = EditBuffer::new();
        let mut model = Rope::new();
        for op in &ops {
            apply(&mut buf, &mut model, op);
        }
        let table = buf.table().clone().with_stride(stride);
        for offset in 0..=table.len() {
            let pos = table.offset_to_line_column(offset).unwrap();
            if table.is_char_boundary(offset) {
                prop_assert_eq!(table.line_column_to_offset(pos).unwrap(), offset);
            } else {
                prop_assert!(table.line_column_to_offset(pos).unwrap_err().is_encoding());
            }
        }
    }
}

// ============================================================================
// History Properties
// ============================================================================

proptest! {
    /// undo followed by redo restores byte-identical content.
    #[test]
    fn undo_redo_is_identity(ops in prop::collection::vec(op(), 1..30)) {
        let mut buf = EditBuffer::new();
        let mut model = Rope::new();
        for op in &ops {
            apply(&mut buf, &mut model, op);
        }
        let before = buf.text();
        if buf.undo().unwrap() {
            prop_assert!(buf.redo().unwrap());
        }
        prop_assert_eq!(buf.text(), before);
    }

    /// Undoing everything walks back through every intermediate state.
    #[test]
    fn full_undo_replays_states_backwards(ops in prop::collection::vec(op(), 1..25)) {
        let mut buf = EditBuffer::with_text("seed\n");
        let mut model = Rope::from_str("seed\n");
        let mut states = vec![buf.text()];
        for op in &ops {
            apply(&mut buf, &mut model, op);
            if buf.text() != *states.last().unwrap() {
                states.push(buf.text());
            }
        }
        while buf.undo().unwrap() {
            states.pop();
            prop_assert_eq!(&buf.text(), states.last().unwrap());
            assert_invariants(buf.table())?;
        }
        prop_assert_eq!(states.len(), 1);
        while buf.redo().unwrap() {}
        prop_assert_eq!(buf.text(), model.to_string());
    }
}

// ============================================================================
// UTF-8 Validator Properties
// ============================================================================

proptest! {
    /// The table-driven validator agrees with the standard library.
    #[test]
    fn validator_matches_std(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let ours = Utf8Validator::validate(&bytes);
        let expected = std::str::from_utf8(&bytes).map(|_| ()).map_err(|e| e.valid_up_to());
        prop_assert_eq!(ours, expected);
    }

    /// Boundary checks agree with `str::is_char_boundary`.
    #[test]
    fn boundary_matches_std(text in "\\PC{0,40}") {
        for i in 0..=text.len() + 1 {
            prop_assert_eq!(
                Utf8Validator::is_char_boundary(text.as_bytes(), i),
                text.is_char_boundary(i)
            );
        }
    }
}
