//! Change notifications for buffer observers.
//!
//! Outside a batch every successful mutation is delivered at once. Inside a
//! batch the changes are merged into one pending event that is delivered when
//! the outermost batch ends.

use crate::text::history::EditDelta;
use bitflags::bitflags;
use std::fmt;
use std::ops::Range;

bitflags! {
    /// What kinds of change a [`ChangeEvent`] covers.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct ChangeFlags: u8 {
        /// Text was inserted.
        const INSERT  = 0x01;
        /// Text was deleted.
        const DELETE  = 0x02;
        /// The number of lines changed.
        const LINES   = 0x04;
        /// The change came from undo or redo.
        const HISTORY = 0x08;
        /// A snapshot was restored; the whole document may differ.
        const RESTORE = 0x10;
    }
}

/// A delivered change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Dirty byte range in the document as it is after the change. Empty when
    /// the change only removed text.
    pub range: Range<usize>,
    /// Individual edits in the order they were applied. After a restore,
    /// only the edits made since the restore are listed.
    pub deltas: Vec<EditDelta>,
    pub flags: ChangeFlags,
    /// Table revision after the last change in the event.
    pub revision: u64,
}

/// Handle returned by [`EditBuffer::subscribe`](crate::EditBuffer::subscribe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Notifier {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
    depth: usize,
    pending: Option<ChangeEvent>,
}

impl Notifier {
    pub(crate) fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub(crate) const fn in_batch(&self) -> bool {
        self.depth > 0
    }

    /// Note an applied edit.
    pub(crate) fn record_edit(&mut self, delta: EditDelta, flags: ChangeFlags, revision: u64) {
        let range = match &self.pending {
            Some(pending) => merge_dirty(&pending.range, &delta),
            None => delta.new_range(),
        };
        let pending = self.pending.get_or_insert_with(|| ChangeEvent {
            range: 0..0,
            deltas: Vec::new(),
            flags: ChangeFlags::empty(),
            revision,
        });
        pending.range = range;
        pending.flags |= flags;
        pending.revision = revision;
        pending.deltas.push(delta);
        self.flush_unless_batched();
    }

    /// Note that the whole document was replaced by a snapshot of length
    /// `len`.
    pub(crate) fn record_restore(&mut self, len: usize, revision: u64) {
        let pending = self.pending.get_or_insert_with(|| ChangeEvent {
            range: 0..len,
            deltas: Vec::new(),
            flags: ChangeFlags::empty(),
            revision,
        });
        pending.range = 0..len;
        pending.deltas.clear();
        pending.flags |= ChangeFlags::RESTORE | ChangeFlags::LINES;
        pending.revision = revision;
        self.flush_unless_batched();
    }

    pub(crate) const fn begin(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn end(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.flush_unless_batched();
    }

    fn flush_unless_batched(&mut self) {
        if self.in_batch() {
            return;
        }
        if let Some(event) = self.pending.take() {
            for (_, listener) in &mut self.listeners {
                listener(&event);
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .field("depth", &self.depth)
            .field("pending", &self.pending)
            .finish()
    }
}

/// Map `dirty` through `delta` and extend it to cover the new text.
fn merge_dirty(dirty: &Range<usize>, delta: &EditDelta) -> Range<usize> {
    let pos = delta.position;
    let old_end = pos + delta.old_length;
    let new_end = pos + delta.new_text.len();
    let map = |x: usize, inside: usize| {
        if x <= pos {
            x
        } else if x >= old_end {
            x - delta.old_length + delta.new_text.len()
        } else {
            inside
        }
    };
    let start = map(dirty.start, pos).min(pos);
    let end = map(dirty.end, new_end).max(new_end);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn insert(position: usize, text: &str) -> EditDelta {
        EditDelta {
            position,
            old_length: 0,
            new_text: text.to_string(),
        }
    }

    fn delete(position: usize, old_length: usize) -> EditDelta {
        EditDelta {
            position,
            old_length,
            new_text: String::new(),
        }
    }

    fn collector(notifier: &mut Notifier) -> Arc<Mutex<Vec<ChangeEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        notifier.subscribe(Box::new(move |event: &ChangeEvent| {
            sink.lock().unwrap().push(event.clone());
        }));
        events
    }

    #[test]
    fn test_merge_dirty_shifts_and_extends() {
        // Insert before the dirty range shifts it right and grows it left.
        assert_eq!(merge_dirty(&(10..12), &insert(2, "abc")), 2..15);
        // Insert after extends to the right.
        assert_eq!(merge_dirty(&(2..4), &insert(8, "xy")), 2..10);
        // Delete that swallows the end of the range clips it.
        assert_eq!(merge_dirty(&(2..8), &delete(5, 10)), 2..5);
        // Delete entirely before shifts left.
        assert_eq!(merge_dirty(&(10..12), &delete(0, 4)), 0..8);
    }

    #[test]
    fn test_immediate_delivery_outside_batch() {
        let mut notifier = Notifier::default();
        let events = collector(&mut notifier);
        notifier.record_edit(insert(0, "hi"), ChangeFlags::INSERT, 1);
        notifier.record_edit(delete(0, 1), ChangeFlags::DELETE, 2);
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].range, 0..2);
        assert_eq!(events[1].range, 0..0);
        assert_eq!(events[1].revision, 2);
    }

    #[test]
    fn test_nested_batch_flushes_once() {
        let mut notifier = Notifier::default();
        let events = collector(&mut notifier);
        notifier.begin();
        notifier.record_edit(insert(0, "a"), ChangeFlags::INSERT, 1);
        notifier.begin();
        notifier.record_edit(insert(1, "\n"), ChangeFlags::INSERT | ChangeFlags::LINES, 2);
        notifier.end();
        assert!(events.lock().unwrap().is_empty());
        notifier.end();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].range, 0..2);
        assert_eq!(events[0].deltas.len(), 2);
        assert_eq!(events[0].flags, ChangeFlags::INSERT | ChangeFlags::LINES);
    }

    #[test]
    fn test_empty_batch_emits_nothing() {
        let mut notifier = Notifier::default();
        let events = collector(&mut notifier);
        notifier.begin();
        notifier.end();
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let mut notifier = Notifier::default();
        let id = notifier.subscribe(Box::new(|_: &ChangeEvent| panic!("unsubscribed listener called")));
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.record_edit(insert(0, "x"), ChangeFlags::INSERT, 1);
    }

    #[test]
    fn test_restore_resets_deltas() {
        let mut notifier = Notifier::default();
        let events = collector(&mut notifier);
        notifier.begin();
        notifier.record_edit(insert(0, "abc"), ChangeFlags::INSERT, 1);
        notifier.record_restore(7, 2);
        notifier.record_edit(insert(7, "!"), ChangeFlags::INSERT, 3);
        notifier.end();

        let events = events.lock().unwrap();
        assert_eq!(events[0].range, 0..8);
        assert_eq!(events[0].deltas, vec![insert(7, "!")]);
        assert!(events[0].flags.contains(ChangeFlags::RESTORE | ChangeFlags::INSERT));
    }
}
