//! Piece table: the document as an ordered list of pieces over two append
//! buffers.
//!
//! Mutations validate everything up front, reserve what the commit needs,
//! and then swap the new pieces in with a single splice. A rejected call
//! leaves the table exactly as it was.

use crate::error::{Error, Result};
use crate::log::{log_debug, log_warn};
use crate::text::append::Buffers;
use crate::text::lines::{DEFAULT_LINE_INDEX_STRIDE, LineColumn, LineIndex};
use crate::text::piece::{Piece, PieceList, Source};
use crate::text::segment::SegmentIter;
use crate::text::view::TextView;
use crate::unicode::Utf8Validator;
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

fn next_table_id() -> u64 {
    NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Piece-table document storage.
pub struct PieceTable {
    id: u64,
    buffers: Buffers,
    list: PieceList,
    lines: LineIndex,
    coalesce_appends: bool,
    revision: u64,
}

/// Captured piece list of a [`PieceTable`].
///
/// Taking one copies piece descriptors only; the text stays in the append
/// buffers, which never overwrite bytes. A snapshot can be restored or read
/// through [`PieceTable::view_snapshot`] after any number of later edits.
#[derive(Clone, Debug)]
pub struct Snapshot {
    owner: u64,
    list: Arc<PieceList>,
    newlines: usize,
    revision: u64,
}

impl Snapshot {
    /// Length in bytes at the time of capture.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.len() == 0
    }

    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.newlines + 1
    }

    #[must_use]
    pub fn piece_count(&self) -> usize {
        self.list.pieces().len()
    }

    /// Revision of the table when the snapshot was taken.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

impl PieceTable {
    /// Create an empty table with zero pieces.
    #[must_use]
    pub fn new() -> Self {
        Self::from_original(Vec::new(), 0)
    }

    /// Create a table holding `text` as one original piece.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let newlines = Utf8Validator::count_newlines(text.as_bytes());
        Self::from_original(text.as_bytes().to_vec(), newlines)
    }

    /// Create a table from loaded bytes, which must be valid UTF-8.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Utf8Validator::validate(&bytes).map_err(Error::invalid_sequence)?;
        let newlines = Utf8Validator::count_newlines(&bytes);
        Ok(Self::from_original(bytes, newlines))
    }

    fn from_original(bytes: Vec<u8>, newlines: usize) -> Self {
        let len = bytes.len();
        Self {
            id: next_table_id(),
            buffers: Buffers::new(bytes),
            list: PieceList::single(Piece::new(Source::Original, 0, len)),
            lines: LineIndex::new(newlines, DEFAULT_LINE_INDEX_STRIDE),
            coalesce_appends: true,
            revision: 0,
        }
    }

    /// Set the number of lines between line index checkpoints.
    #[must_use]
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.set_line_index_stride(stride);
        self
    }

    pub fn set_line_index_stride(&mut self, stride: usize) {
        self.lines.set_stride(stride);
    }

    #[must_use]
    pub const fn line_index_stride(&self) -> usize {
        self.lines.stride()
    }

    /// Whether typing at the end of the newest insert grows that piece
    /// instead of adding a new one.
    pub fn set_coalesce_appends(&mut self, enabled: bool) {
        self.coalesce_appends = enabled;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.list.len() == 0
    }

    /// Number of lines. An empty table has one empty line.
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    #[must_use]
    pub fn piece_count(&self) -> usize {
        self.list.pieces().len()
    }

    #[must_use]
    pub fn pieces(&self) -> &[Piece] {
        self.list.pieces()
    }

    /// Bytes held by the added buffer, including text no longer referenced.
    #[must_use]
    pub fn added_len(&self) -> usize {
        self.buffers.added().len()
    }

    /// Bytes of the original load content.
    #[must_use]
    pub fn original_len(&self) -> usize {
        self.buffers.original_len()
    }

    /// Counter bumped by every successful mutation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Read-only view of the current content.
    #[must_use]
    pub const fn view(&self) -> TextView<'_> {
        TextView::new(&self.buffers, &self.list)
    }

    pub fn slice(&self, range: Range<usize>) -> Result<Cow<'_, [u8]>> {
        self.view().slice(range)
    }

    pub fn slice_str(&self, range: Range<usize>) -> Result<Cow<'_, str>> {
        self.view().slice_str(range)
    }

    /// Like [`slice`](Self::slice), composing multi-piece ranges into a
    /// caller-owned `arena`.
    pub fn slice_in<'b>(
        &'b self,
        range: Range<usize>,
        arena: &'b mut Vec<u8>,
    ) -> Result<&'b [u8]> {
        self.view().slice_in(range, arena)
    }

    pub fn iterate(&self, range: Range<usize>) -> Result<SegmentIter<'_>> {
        self.view().iterate(range)
    }

    #[must_use]
    pub fn segments(&self) -> SegmentIter<'_> {
        self.view().segments()
    }

    #[must_use]
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.view().byte_at(offset)
    }

    #[must_use]
    pub fn is_char_boundary(&self, offset: usize) -> bool {
        self.view().is_char_boundary(offset)
    }

    /// Stream the content into `writer` without building a contiguous copy.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<()> {
        self.view().write_to(writer)
    }

    // ------------------------------------------------------------------
    // Lines
    // ------------------------------------------------------------------

    /// Byte range of `line`, excluding its `\n`.
    pub fn line_range(&self, line: usize) -> Result<Range<usize>> {
        self.lines.line_range(&self.view(), line)
    }

    /// Byte range of `line`, including its `\n` when it has one.
    pub fn line_range_with_terminator(&self, line: usize) -> Result<Range<usize>> {
        let range = self.line_range(line)?;
        if range.end < self.len() {
            Ok(range.start..range.end + 1)
        } else {
            Ok(range)
        }
    }

    /// Text of `line`, excluding its `\n`.
    pub fn line_text(&self, line: usize) -> Result<Cow<'_, str>> {
        self.slice_str(self.line_range(line)?)
    }

    /// Line and byte column of `offset`.
    pub fn offset_to_line_column(&self, offset: usize) -> Result<LineColumn> {
        let (line, start) = self.lines.locate(&self.view(), offset)?;
        Ok(LineColumn::new(line, offset - start))
    }

    /// Byte offset of a line and byte column. The column may point at the
    /// end of the line but not past it, and must not land inside a
    /// multi-byte character.
    pub fn line_column_to_offset(&self, position: LineColumn) -> Result<usize> {
        let range = self.line_range(position.line)?;
        if position.column > range.len() {
            return Err(Error::OutOfBounds {
                offset: range.start + position.column,
                len: range.end,
            });
        }
        let offset = range.start + position.column;
        self.view().check_boundary(offset)?;
        Ok(offset)
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Insert `text` at byte `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.insert_bytes(offset, text.as_bytes())
    }

    /// Insert raw bytes at `offset`. The bytes must be valid UTF-8.
    pub fn insert_bytes(&mut self, offset: usize, text: &[u8]) -> Result<()> {
        self.try_insert(offset, text).inspect_err(|e| {
            log_debug!("insert of {} bytes at {offset} rejected: {e}", text.len());
        })
    }

    fn try_insert(&mut self, offset: usize, text: &[u8]) -> Result<()> {
        let len = self.len();
        if offset > len {
            return Err(Error::OutOfBounds { offset, len });
        }
        Utf8Validator::validate(text).map_err(Error::invalid_sequence)?;
        self.view().check_boundary(offset)?;
        if text.is_empty() {
            return Ok(());
        }

        let (idx, within) = self.list.locate(offset);
        let added_end = self.buffers.added().len();
        let grow = if within == 0 && self.coalesce_appends {
            idx.checked_sub(1)
                .map(|prev| (prev, self.list.pieces()[prev]))
                .filter(|(_, p)| p.source() == Source::Added && p.end() == added_end)
        } else {
            None
        };

        self.list.reserve(2)?;
        let added = self.buffers.append(text)?;
        let inserted = Piece::new(Source::Added, added.start, added.len());

        if let Some((prev, piece)) = grow {
            self.list.splice(prev..idx, &[piece.extended(text.len())]);
        } else if within == 0 {
            self.list.splice(idx..idx, &[inserted]);
        } else {
            let (left, right) = self.list.pieces()[idx].split(within);
            self.list.splice(idx..idx + 1, &[left, inserted, right]);
        }

        self.lines.on_insert(Utf8Validator::count_newlines(text));
        self.revision += 1;
        Ok(())
    }

    /// Remove the bytes in `range`.
    pub fn delete(&mut self, range: Range<usize>) -> Result<()> {
        self.try_delete(range.clone()).inspect_err(|e| {
            log_debug!("delete of {}..{} rejected: {e}", range.start, range.end);
        })
    }

    fn try_delete(&mut self, range: Range<usize>) -> Result<()> {
        let view = self.view();
        view.check_range(&range)?;
        view.check_boundary(range.start)?;
        view.check_boundary(range.end)?;
        if range.is_empty() {
            return Ok(());
        }
        let removed_newlines = view.count_newlines(range.clone())?;

        let (first, head) = self.list.locate(range.start);
        let (last, tail) = self.list.locate(range.end);
        let pieces = self.list.pieces();

        let mut remainder = [Piece::new(Source::Added, 0, 0); 2];
        let mut kept = 0;
        if head > 0 {
            remainder[kept] = pieces[first].split(head).0;
            kept += 1;
        }
        let span_end = if tail > 0 {
            remainder[kept] = pieces[last].split(tail).1;
            kept += 1;
            last + 1
        } else {
            last
        };

        self.list.reserve(1)?;
        self.list.splice(first..span_end, &remainder[..kept]);
        self.lines.on_delete(removed_newlines);
        self.revision += 1;
        Ok(())
    }

    /// Replace the bytes in `range` with `text`.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<()> {
        let view = self.view();
        view.check_range(&range)?;
        view.check_boundary(range.start)?;
        view.check_boundary(range.end)?;

        let saved = (self.list.clone(), self.lines.newlines(), self.revision);
        let start = range.start;
        self.delete(range)?;
        if let Err(e) = self.insert(start, text) {
            let (list, newlines, revision) = saved;
            self.list = list;
            self.lines.reset(newlines);
            self.revision = revision;
            return Err(e);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Capture the current piece list.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            owner: self.id,
            list: Arc::new(self.list.clone()),
            newlines: self.lines.newlines(),
            revision: self.revision,
        }
    }

    /// Make the captured piece list live again.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.check_owner(snapshot)?;
        self.list = PieceList::clone(&snapshot.list);
        self.lines.reset(snapshot.newlines);
        self.revision += 1;
        log_debug!(
            "restored snapshot of revision {} ({} bytes, {} pieces)",
            snapshot.revision,
            self.len(),
            self.piece_count()
        );
        Ok(())
    }

    /// Read-only view of a snapshot's content, as it was when captured.
    pub fn view_snapshot<'a>(&'a self, snapshot: &'a Snapshot) -> Result<TextView<'a>> {
        self.check_owner(snapshot)?;
        Ok(TextView::new(&self.buffers, &snapshot.list))
    }

    fn check_owner(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.owner == self.id {
            Ok(())
        } else {
            log_warn!(
                "snapshot from table {} used with table {}",
                snapshot.owner,
                self.id
            );
            Err(Error::ForeignSnapshot)
        }
    }
}

impl Default for PieceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PieceTable {
    /// Clones are independent tables; snapshots of one cannot be restored
    /// into the other.
    fn clone(&self) -> Self {
        Self {
            id: next_table_id(),
            buffers: self.buffers.clone(),
            list: self.list.clone(),
            lines: self.lines.clone(),
            coalesce_appends: self.coalesce_appends,
            revision: self.revision,
        }
    }
}

impl fmt::Display for PieceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.view(), f)
    }
}

impl fmt::Debug for PieceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PieceTable")
            .field("len", &self.len())
            .field("line_count", &self.line_count())
            .field("pieces", &self.list.pieces())
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
