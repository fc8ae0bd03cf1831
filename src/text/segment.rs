//! Zero-copy traversal of the pieces covering a byte range.

use crate::text::append::Buffers;
use crate::text::piece::Piece;
use std::iter::FusedIterator;

/// Lazy iterator over the byte segments of a range.
///
/// Yields one borrowed slice per piece intersecting the range, clipped to the
/// range. Segments point straight into the append buffers; nothing is copied.
/// Because every piece boundary is a code-point boundary, each segment is
/// valid UTF-8 on its own.
///
/// The iterator borrows the table, so the borrow checker already rules out
/// holding one across a mutation. Use a [`Snapshot`](crate::Snapshot) for
/// reads that must outlive later edits.
#[derive(Clone, Debug)]
pub struct SegmentIter<'a> {
    buffers: &'a Buffers,
    pieces: &'a [Piece],
    /// Offset into the first piece where the range begins.
    skip: usize,
    /// Total bytes covered.
    len: usize,
    idx: usize,
    consumed: usize,
}

impl<'a> SegmentIter<'a> {
    pub(crate) const fn new(
        buffers: &'a Buffers,
        pieces: &'a [Piece],
        skip: usize,
        len: usize,
    ) -> Self {
        Self {
            buffers,
            pieces,
            skip,
            len,
            idx: 0,
            consumed: 0,
        }
    }

    /// Bytes not yet yielded.
    #[must_use]
    pub const fn remaining_len(&self) -> usize {
        self.len - self.consumed
    }

    /// Start over from the beginning of the range.
    pub fn rewind(&mut self) {
        self.idx = 0;
        self.consumed = 0;
    }
}

impl<'a> Iterator for SegmentIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.consumed >= self.len {
            return None;
        }
        let piece = self.pieces.get(self.idx)?;
        let bytes = self.buffers.bytes(piece);
        let from = if self.idx == 0 { self.skip } else { 0 };
        let take = (bytes.len() - from).min(self.len - self.consumed);
        self.idx += 1;
        self.consumed += take;
        Some(&bytes[from..from + take])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.consumed >= self.len {
            return (0, Some(0));
        }
        (1, Some(self.pieces.len() - self.idx))
    }
}

impl FusedIterator for SegmentIter<'_> {}
