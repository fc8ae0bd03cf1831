//! Bounded undo/redo history.
//!
//! Entries are plain values describing one applied edit. [`History`] only
//! stores them; [`EditBuffer`](crate::EditBuffer) decides when an entry is
//! applied and moves it between stacks once the table accepted it.

use std::collections::VecDeque;
use std::ops::Range;

/// Default maximum number of undo entries to retain.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Direction of a recorded edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditKind {
    Insert,
    Delete,
}

/// A reversible edit.
///
/// For an insert, `content` is the inserted text; for a delete, it is the
/// text that was removed. Either way the entry carries enough to undo itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoEntry {
    kind: EditKind,
    position: usize,
    content: String,
}

impl UndoEntry {
    #[must_use]
    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Insert,
            position,
            content: text.into(),
        }
    }

    #[must_use]
    pub fn delete(position: usize, removed: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Delete,
            position,
            content: removed.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EditKind {
        self.kind
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Bytes of content.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Range the content occupies in the document that contains it: after
    /// an insert, or before a delete.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.position..self.position + self.content.len()
    }

    /// The edit that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let kind = match self.kind {
            EditKind::Insert => EditKind::Delete,
            EditKind::Delete => EditKind::Insert,
        };
        Self {
            kind,
            position: self.position,
            content: self.content.clone(),
        }
    }

    /// Change description of applying this entry.
    #[must_use]
    pub fn delta(&self) -> EditDelta {
        match self.kind {
            EditKind::Insert => EditDelta {
                position: self.position,
                old_length: 0,
                new_text: self.content.clone(),
            },
            EditKind::Delete => EditDelta {
                position: self.position,
                old_length: self.content.len(),
                new_text: String::new(),
            },
        }
    }
}

/// One incremental document change: `old_length` bytes at `position` were
/// replaced by `new_text`.
///
/// This is the shape language servers consume for incremental sync.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditDelta {
    pub position: usize,
    pub old_length: usize,
    pub new_text: String,
}

impl EditDelta {
    /// Range replaced, in coordinates before the change.
    #[must_use]
    pub const fn old_range(&self) -> Range<usize> {
        self.position..self.position + self.old_length
    }

    /// Range of the new text, in coordinates after the change.
    #[must_use]
    pub fn new_range(&self) -> Range<usize> {
        self.position..self.position + self.new_text.len()
    }
}

/// Undo and redo stacks with a bounded undo depth.
///
/// Recording past capacity evicts the oldest undo entry. Undo and redo move
/// entries between the stacks and never clear either one; only a new
/// recorded edit clears the redo stack.
#[derive(Clone, Debug)]
pub struct History {
    undo: VecDeque<UndoEntry>,
    redo: Vec<UndoEntry>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history retaining at most `capacity` undo entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest entries if it shrank.
    /// Returns how many were evicted.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity;
        self.enforce_capacity()
    }

    /// Push a new user edit, clear the redo stack, and evict past capacity.
    /// Returns how many entries were evicted.
    pub fn record(&mut self, entry: UndoEntry) -> usize {
        self.redo.clear();
        self.undo.push_back(entry);
        self.enforce_capacity()
    }

    fn enforce_capacity(&mut self) -> usize {
        let excess = self.undo.len().saturating_sub(self.capacity);
        self.undo.drain(..excess);
        excess
    }

    /// Entry the next undo would revert.
    #[must_use]
    pub fn peek_undo(&self) -> Option<&UndoEntry> {
        self.undo.back()
    }

    /// Entry the next redo would re-apply.
    #[must_use]
    pub fn peek_redo(&self) -> Option<&UndoEntry> {
        self.redo.last()
    }

    /// Move the newest undo entry to the redo stack after it was reverted.
    pub(crate) fn commit_undo(&mut self) {
        if let Some(entry) = self.undo.pop_back() {
            self.redo.push(entry);
        }
    }

    /// Move the newest redo entry back to the undo stack after it was
    /// re-applied.
    pub(crate) fn commit_redo(&mut self) {
        if let Some(entry) = self.redo.pop() {
            self.undo.push_back(entry);
            self.enforce_capacity();
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
