//! Fuzz target for edit sequences.
//!
//! Arbitrary inserts, deletes, undo, redo, snapshots and restores run against
//! an `EditBuffer` and a plain `String` model. Rejected edits must leave the
//! buffer unchanged; accepted ones must match the model.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use textcore::EditBuffer;

#[derive(Arbitrary, Debug)]
enum Op {
    Insert { offset: u16, bytes: Vec<u8> },
    Delete { start: u16, len: u8 },
    Undo,
    Redo,
    Snapshot,
    Restore,
    Batch(Vec<(u16, String)>),
}

fuzz_target!(|input: (String, Vec<Op>)| {
    let (base, ops) = input;
    let mut buf = EditBuffer::with_text(&base);
    let mut saved = None;

    for op in ops.into_iter().take(256) {
        let before = buf.text();
        match op {
            Op::Insert { offset, bytes } => {
                let offset = usize::from(offset);
                let valid = offset <= before.len()
                    && before.is_char_boundary(offset)
                    && std::str::from_utf8(&bytes).is_ok();
                let result = match std::str::from_utf8(&bytes) {
                    Ok(text) => buf.insert(offset, text),
                    Err(_) => buf.table().clone().insert_bytes(offset, &bytes),
                };
                assert_eq!(result.is_ok(), valid);
                if valid {
                    let mut model = before;
                    model.insert_str(offset, std::str::from_utf8(&bytes).unwrap_or(""));
                    assert_eq!(buf.text(), model);
                } else {
                    assert_eq!(buf.text(), before);
                }
            }
            Op::Delete { start, len } => {
                let start = usize::from(start);
                let end = start + usize::from(len);
                let valid = end <= before.len()
                    && before.is_char_boundary(start)
                    && before.is_char_boundary(end);
                assert_eq!(buf.delete(start..end).is_ok(), valid);
                if valid {
                    let mut model = before;
                    model.replace_range(start..end, "");
                    assert_eq!(buf.text(), model);
                } else {
                    assert_eq!(buf.text(), before);
                }
            }
            Op::Undo => {
                let undone = buf.undo().unwrap();
                if undone {
                    buf.redo().unwrap();
                    assert_eq!(buf.text(), before);
                    buf.undo().unwrap();
                }
            }
            Op::Redo => {
                let _ = buf.redo().unwrap();
            }
            Op::Snapshot => saved = Some((buf.snapshot(), before)),
            Op::Restore => {
                if let Some((snap, text)) = &saved {
                    buf.restore(snap).unwrap();
                    assert_eq!(&buf.text(), text);
                    assert!(!buf.can_undo());
                }
            }
            Op::Batch(edits) => {
                let mut batch = buf.batch();
                for (offset, text) in edits.into_iter().take(16) {
                    let _ = batch.insert(usize::from(offset), &text);
                }
            }
        }

        let table = buf.table();
        let sum: usize = table.pieces().iter().map(|p| p.len()).sum();
        assert_eq!(sum, table.len());
        assert_eq!(table.line_count(), buf.text().matches('\n').count() + 1);
    }
});
