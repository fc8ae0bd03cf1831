//! Editable text buffer with undo/redo and change notifications.
//!
//! This module provides [`EditBuffer`], which wraps a [`PieceTable`] with a
//! bounded undo/redo history and batched change notifications.
//!
//! # Examples
//!
//! ```
//! use textcore::EditBuffer;
//!
//! let mut buf = EditBuffer::with_text("Hello World");
//! buf.delete(10..11).unwrap(); // Removes 'd'
//! assert_eq!(buf.text(), "Hello Worl");
//!
//! // Undo restores deleted text
//! assert!(buf.undo().unwrap());
//! assert_eq!(buf.text(), "Hello World");
//! ```

use crate::error::Result;
use crate::log::log_debug;
use crate::text::history::{
    DEFAULT_HISTORY_CAPACITY, EditDelta, EditKind, History, UndoEntry,
};
use crate::text::lines::{DEFAULT_LINE_INDEX_STRIDE, LineColumn};
use crate::text::notify::{ChangeEvent, ChangeFlags, Notifier, SubscriptionId};
use crate::text::segment::SegmentIter;
use crate::text::table::{PieceTable, Snapshot};
use crate::unicode::{self, WidthMethod};
use std::borrow::Cow;
use std::fmt;
use std::ops::{Deref, DerefMut, Range};

/// Options for an [`EditBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferOptions {
    /// Undo entries retained before the oldest is evicted.
    pub history_capacity: usize,
    /// Lines between line index checkpoints (minimum 1).
    pub line_index_stride: usize,
    /// Grow the newest inserted piece when typing continues at its end.
    pub coalesce_appends: bool,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            line_index_stride: DEFAULT_LINE_INDEX_STRIDE,
            coalesce_appends: true,
        }
    }
}

/// A user edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOp {
    Insert { offset: usize, text: String },
    Delete { range: Range<usize> },
}

/// Text buffer with undo/redo and change notifications.
///
/// Every edit goes through [`record_and_apply`](Self::record_and_apply): the
/// reversing [`UndoEntry`] is captured before the table changes and recorded
/// once the table accepted the edit. A rejected edit leaves content, history
/// and observers untouched.
///
/// # History
///
/// History depth is bounded (default 1000 entries). Past that, the oldest
/// entry is evicted and can no longer be undone. Undo and redo on an empty
/// stack return `Ok(false)`.
pub struct EditBuffer {
    table: PieceTable,
    history: History,
    notifier: Notifier,
    options: BufferOptions,
}

impl Default for EditBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EditBuffer {
    /// Create a new empty edit buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options("", BufferOptions::default())
    }

    /// Create an edit buffer with initial text.
    #[must_use]
    pub fn with_text(text: &str) -> Self {
        Self::with_options(text, BufferOptions::default())
    }

    /// Create an edit buffer from loaded bytes, which must be valid UTF-8.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let options = BufferOptions::default();
        Ok(Self::from_table(PieceTable::from_bytes(bytes)?, options))
    }

    /// Create an edit buffer with a custom undo history capacity.
    #[must_use]
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self::with_options(
            "",
            BufferOptions {
                history_capacity: capacity,
                ..BufferOptions::default()
            },
        )
    }

    #[must_use]
    pub fn with_options(text: &str, options: BufferOptions) -> Self {
        Self::from_table(PieceTable::from_text(text), options)
    }

    fn from_table(mut table: PieceTable, options: BufferOptions) -> Self {
        table.set_line_index_stride(options.line_index_stride);
        table.set_coalesce_appends(options.coalesce_appends);
        Self {
            table,
            history: History::with_capacity(options.history_capacity),
            notifier: Notifier::default(),
            options,
        }
    }

    #[must_use]
    pub const fn options(&self) -> &BufferOptions {
        &self.options
    }

    /// Set the undo history capacity, evicting the oldest entries if the
    /// history is already longer.
    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.options.history_capacity = capacity;
        let evicted = self.history.set_capacity(capacity);
        if evicted > 0 {
            log_debug!("history capacity set to {capacity}, evicted {evicted} entries");
        }
    }

    #[must_use]
    pub const fn history_capacity(&self) -> usize {
        self.history.capacity()
    }

    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Get the underlying piece table.
    #[must_use]
    pub const fn table(&self) -> &PieceTable {
        &self.table
    }

    /// Get the full text content.
    #[must_use]
    pub fn text(&self) -> String {
        self.table.to_string()
    }

    /// Replace the entire text, resetting history.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.table.replace(0..self.table.len(), text)?;
        self.history.clear();
        self.notifier
            .record_restore(self.table.len(), self.table.revision());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Apply a user edit and record how to reverse it.
    ///
    /// Clears the redo stack. Empty edits are validated but neither applied
    /// nor recorded.
    pub fn record_and_apply(&mut self, op: EditOp) -> Result<()> {
        let entry = match op {
            EditOp::Insert { offset, text } => UndoEntry::insert(offset, text),
            EditOp::Delete { range } => {
                let removed = self.table.slice_str(range.clone())?.into_owned();
                UndoEntry::delete(range.start, removed)
            }
        };
        self.apply(&entry)?;
        if entry.is_empty() {
            return Ok(());
        }
        let (delta, flags) = change_of(&entry, ChangeFlags::empty());
        let evicted = self.history.record(entry);
        if evicted > 0 {
            log_debug!("history full, evicted {evicted} oldest entries");
        }
        self.notifier
            .record_edit(delta, flags, self.table.revision());
        Ok(())
    }

    /// Insert `text` at byte `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.record_and_apply(EditOp::Insert {
            offset,
            text: text.to_owned(),
        })
    }

    /// Delete the bytes in `range`.
    pub fn delete(&mut self, range: Range<usize>) -> Result<()> {
        self.record_and_apply(EditOp::Delete { range })
    }

    /// Revert the most recent edit.
    ///
    /// Returns `Ok(false)` if there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(entry) = self.history.peek_undo() else {
            log_debug!("undo requested with empty history");
            return Ok(false);
        };
        let inverse = entry.inverse();
        self.apply(&inverse)?;
        self.history.commit_undo();
        self.notify(&inverse, ChangeFlags::HISTORY);
        Ok(true)
    }

    /// Re-apply the most recently undone edit.
    ///
    /// Returns `Ok(false)` if there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(entry) = self.history.peek_redo().cloned() else {
            log_debug!("redo requested with empty redo stack");
            return Ok(false);
        };
        self.apply(&entry)?;
        self.history.commit_redo();
        self.notify(&entry, ChangeFlags::HISTORY);
        Ok(true)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn apply(&mut self, entry: &UndoEntry) -> Result<()> {
        match entry.kind() {
            EditKind::Insert => self.table.insert(entry.position(), entry.content()),
            EditKind::Delete => self.table.delete(entry.range()),
        }
    }

    fn notify(&mut self, entry: &UndoEntry, extra: ChangeFlags) {
        let (delta, flags) = change_of(entry, extra);
        self.notifier
            .record_edit(delta, flags, self.table.revision());
    }

    // ------------------------------------------------------------------
    // Snapshots and notifications
    // ------------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.table.snapshot()
    }

    /// Restore a snapshot of this buffer and clear history.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.table.restore(snapshot)?;
        self.history.clear();
        self.notifier
            .record_restore(self.table.len(), self.table.revision());
        Ok(())
    }

    /// Register a change listener.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(Box::new(listener))
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Group edits into one change notification.
    ///
    /// Listeners hear nothing until the returned guard (and every guard
    /// nested inside it) is dropped, then receive a single merged event.
    /// Dropping happens on every exit path, including `?` and panics.
    ///
    /// ```
    /// use textcore::EditBuffer;
    ///
    /// let mut buf = EditBuffer::new();
    /// {
    ///     let mut batch = buf.batch();
    ///     batch.insert(0, "fn main() {\n")?;
    ///     batch.insert(12, "}\n")?;
    /// }
    /// assert_eq!(buf.line_count(), 3);
    /// # Ok::<(), textcore::Error>(())
    /// ```
    pub fn batch(&mut self) -> BatchGuard<'_> {
        self.notifier.begin();
        BatchGuard { buffer: self }
    }

    #[must_use]
    pub const fn in_batch(&self) -> bool {
        self.notifier.in_batch()
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.table.line_count()
    }

    pub fn slice(&self, range: Range<usize>) -> Result<Cow<'_, [u8]>> {
        self.table.slice(range)
    }

    pub fn slice_str(&self, range: Range<usize>) -> Result<Cow<'_, str>> {
        self.table.slice_str(range)
    }

    pub fn iterate(&self, range: Range<usize>) -> Result<SegmentIter<'_>> {
        self.table.iterate(range)
    }

    pub fn line_range(&self, line: usize) -> Result<Range<usize>> {
        self.table.line_range(line)
    }

    pub fn offset_to_line_column(&self, offset: usize) -> Result<LineColumn> {
        self.table.offset_to_line_column(offset)
    }

    /// Grapheme-cluster column of `offset` within its line.
    pub fn grapheme_column(&self, offset: usize) -> Result<usize> {
        let prefix = self.line_prefix(offset)?;
        Ok(unicode::grapheme_column(&prefix))
    }

    /// Rendered cell column of `offset` within its line.
    pub fn display_column(&self, offset: usize, tab_width: usize) -> Result<usize> {
        let prefix = self.line_prefix(offset)?;
        Ok(unicode::display_column(
            &prefix,
            tab_width,
            WidthMethod::default(),
        ))
    }

    fn line_prefix(&self, offset: usize) -> Result<Cow<'_, str>> {
        let position = self.table.offset_to_line_column(offset)?;
        self.table.slice_str(offset - position.column..offset)
    }
}

impl fmt::Debug for EditBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditBuffer")
            .field("table", &self.table)
            .field("history", &self.history)
            .field("notifier", &self.notifier)
            .finish()
    }
}

fn change_of(entry: &UndoEntry, extra: ChangeFlags) -> (EditDelta, ChangeFlags) {
    let mut flags = extra
        | match entry.kind() {
            EditKind::Insert => ChangeFlags::INSERT,
            EditKind::Delete => ChangeFlags::DELETE,
        };
    if entry.content().contains('\n') {
        flags |= ChangeFlags::LINES;
    }
    (entry.delta(), flags)
}

/// Open notification batch on an [`EditBuffer`].
///
/// Dereferences to the buffer. The merged change event is delivered when the
/// outermost guard drops.
pub struct BatchGuard<'a> {
    buffer: &'a mut EditBuffer,
}

impl Deref for BatchGuard<'_> {
    type Target = EditBuffer;

    fn deref(&self) -> &EditBuffer {
        self.buffer
    }
}

impl DerefMut for BatchGuard<'_> {
    fn deref_mut(&mut self) -> &mut EditBuffer {
        self.buffer
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.buffer.notifier.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_edit_basic() {
        let mut edit = EditBuffer::new();
        edit.insert(0, "Hello").unwrap();
        assert_eq!(edit.text(), "Hello");
        assert_eq!(edit.len(), 5);
    }

    #[test]
    fn test_edit_undo() {
        let mut edit = EditBuffer::new();
        edit.insert(0, "Hello").unwrap();
        edit.insert(5, " World").unwrap();
        assert_eq!(edit.text(), "Hello World");

        assert!(edit.undo().unwrap());
        assert_eq!(edit.text(), "Hello");

        assert!(edit.undo().unwrap());
        assert_eq!(edit.text(), "");
        assert!(!edit.undo().unwrap());
    }

    #[test]
    fn test_edit_redo() {
        let mut edit = EditBuffer::new();
        edit.insert(0, "Hello").unwrap();
        edit.undo().unwrap();
        assert_eq!(edit.text(), "");

        assert!(edit.redo().unwrap());
        assert_eq!(edit.text(), "Hello");
        assert!(!edit.redo().unwrap());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut edit = EditBuffer::with_text("abc");
        edit.delete(0..1).unwrap();
        edit.undo().unwrap();
        assert!(edit.can_redo());
        edit.insert(3, "d").unwrap();
        assert!(!edit.can_redo());
        assert_eq!(edit.text(), "abcd");
    }

    #[test]
    fn test_history_depth_limit() {
        let mut edit = EditBuffer::with_history_capacity(3);
        assert_eq!(edit.history_capacity(), 3);

        for i in 0..5 {
            let offset = edit.len();
            edit.insert(offset, &format!("{i}")).unwrap();
        }
        assert_eq!(edit.text(), "01234");

        // Should only be able to undo 3 times (depth limit)
        assert!(edit.undo().unwrap()); // undo "4"
        assert!(edit.undo().unwrap()); // undo "3"
        assert!(edit.undo().unwrap()); // undo "2"
        assert!(!edit.undo().unwrap()); // no more undo available

        assert_eq!(edit.text(), "01");
    }

    #[test]
    fn test_set_history_capacity() {
        let mut edit = EditBuffer::new();
        assert_eq!(edit.history_capacity(), 1000);

        for _ in 0..10 {
            edit.insert(0, "x").unwrap();
        }
        edit.set_history_capacity(4);
        assert_eq!(edit.history_capacity(), 4);
        assert_eq!(edit.history().undo_len(), 4);
    }

    #[test]
    fn test_rejected_edit_leaves_history() {
        let mut edit = EditBuffer::with_text("é");
        assert!(edit.insert(1, "x").unwrap_err().is_encoding());
        assert!(edit.delete(0..5).unwrap_err().is_bounds());
        assert!(!edit.can_undo());
        assert_eq!(edit.text(), "é");
    }

    #[test]
    fn test_empty_edit_not_recorded() {
        let mut edit = EditBuffer::with_text("abc");
        edit.insert(1, "").unwrap();
        edit.delete(2..2).unwrap();
        assert!(!edit.can_undo());
        assert!(edit.insert(9, "").unwrap_err().is_bounds());
    }

    #[test]
    fn test_restore_clears_history() {
        let mut edit = EditBuffer::with_text("one");
        let snap = edit.snapshot();
        edit.insert(3, " two").unwrap();
        edit.restore(&snap).unwrap();
        assert_eq!(edit.text(), "one");
        assert!(!edit.can_undo());
        assert!(!edit.can_redo());

        let other = EditBuffer::with_text("one");
        let foreign = other.snapshot();
        assert!(matches!(edit.restore(&foreign), Err(Error::ForeignSnapshot)));
    }

    #[test]
    fn test_set_text_resets() {
        let mut edit = EditBuffer::with_text("old");
        edit.insert(0, "x").unwrap();
        let snap = edit.snapshot();
        edit.set_text("new\ntext").unwrap();
        assert_eq!(edit.text(), "new\ntext");
        assert_eq!(edit.line_count(), 2);
        assert!(!edit.can_undo());
        edit.restore(&snap).unwrap();
        assert_eq!(edit.text(), "xold");
    }

    #[test]
    fn test_batch_delivers_one_event() {
        let mut edit = EditBuffer::with_text("a\nb");
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        edit.subscribe(move |event: &ChangeEvent| sink.lock().unwrap().push(event.clone()));

        {
            let mut batch = edit.batch();
            batch.insert(1, "1").unwrap();
            batch.insert(4, "2").unwrap();
            assert!(batch.in_batch());
        }
        assert!(!edit.in_batch());

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].range, 1..5);
        assert_eq!(events[0].deltas.len(), 2);
        assert_eq!(events[0].flags, ChangeFlags::INSERT);
    }

    #[test]
    fn test_undo_event_flags() {
        let mut edit = EditBuffer::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        edit.subscribe(move |event: &ChangeEvent| sink.lock().unwrap().push(event.flags));
        edit.insert(0, "line\n").unwrap();
        edit.undo().unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                ChangeFlags::INSERT | ChangeFlags::LINES,
                ChangeFlags::DELETE | ChangeFlags::LINES | ChangeFlags::HISTORY,
            ]
        );
    }

    #[test]
    fn test_columns() {
        let edit = EditBuffer::with_text("x\n\tné好");
        // Line 1 starts at byte 2: tab, 'n', 'é' (2 bytes), '好' (3 bytes).
        assert_eq!(edit.grapheme_column(6).unwrap(), 3);
        assert_eq!(edit.display_column(6, 4).unwrap(), 6);
        assert_eq!(edit.display_column(9, 4).unwrap(), 8);
        assert!(edit.display_column(5, 4).unwrap_err().is_encoding());
    }

    #[test]
    fn test_options_applied() {
        let options = BufferOptions {
            history_capacity: 2,
            line_index_stride: 1,
            coalesce_appends: false,
        };
        let mut edit = EditBuffer::with_options("", options);
        edit.insert(0, "a").unwrap();
        edit.insert(1, "b").unwrap();
        assert_eq!(edit.table().piece_count(), 2);
        assert_eq!(edit.table().line_index_stride(), 1);
        assert_eq!(edit.options(), &options);
    }
}
