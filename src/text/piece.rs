//! Piece descriptors and the ordered piece list.

use crate::error::{Error, Result};
use std::ops::Range;

/// Which append buffer a piece points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    /// The immutable content the buffer was opened with.
    Original,
    /// The grow-only buffer of inserted text.
    Added,
}

/// A byte range in one of the two append buffers.
///
/// Pieces are plain values. Editing never changes a piece in place: a split
/// produces two new pieces and the list swaps them in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    source: Source,
    start: usize,
    len: usize,
}

impl Piece {
    /// Create a piece. `len` must be non-zero for pieces stored in a table.
    #[must_use]
    pub const fn new(source: Source, start: usize, len: usize) -> Self {
        Self { source, start, len }
    }

    #[must_use]
    pub const fn source(&self) -> Source {
        self.source
    }

    /// Start offset inside the backing buffer.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// One past the last byte inside the backing buffer.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Split at `at` bytes into the piece. Either half may be empty.
    #[must_use]
    pub const fn split(self, at: usize) -> (Self, Self) {
        (
            Self::new(self.source, self.start, at),
            Self::new(self.source, self.start + at, self.len - at),
        )
    }

    /// The same piece grown by `extra` bytes at its end.
    #[must_use]
    pub(crate) const fn extended(self, extra: usize) -> Self {
        Self::new(self.source, self.start, self.len + extra)
    }
}

/// Ordered pieces partitioning `[0, len)`, with cached start offsets.
///
/// Invariants: no piece is empty, `starts[i]` is the document offset of
/// `pieces[i]`, and `len` is the sum of piece lengths.
#[derive(Clone, Debug, Default)]
pub(crate) struct PieceList {
    pieces: Vec<Piece>,
    starts: Vec<usize>,
    len: usize,
}

impl PieceList {
    pub(crate) fn single(piece: Piece) -> Self {
        if piece.is_empty() {
            return Self::default();
        }
        Self {
            pieces: vec![piece],
            starts: vec![0],
            len: piece.len(),
        }
    }

    pub(crate) fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Piece index containing `offset` and the offset inside that piece.
    ///
    /// An offset on a piece boundary resolves to the piece that starts there;
    /// `offset >= len` resolves to `(piece_count, 0)`.
    pub(crate) fn locate(&self, offset: usize) -> (usize, usize) {
        if offset >= self.len {
            return (self.pieces.len(), 0);
        }
        let idx = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        (idx, offset - self.starts[idx])
    }

    /// Make room for `additional` more pieces so the next [`splice`](Self::splice)
    /// cannot fail.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<()> {
        let capacity = |_| Error::Capacity {
            requested: additional,
        };
        self.pieces.try_reserve(additional).map_err(capacity)?;
        self.starts.try_reserve(additional).map_err(capacity)
    }

    /// Replace `span` with `with` in one batch and refresh the offset cache
    /// from the first touched piece onward.
    pub(crate) fn splice(&mut self, span: Range<usize>, with: &[Piece]) {
        debug_assert!(with.iter().all(|p| !p.is_empty()));
        let first = span.start;
        self.pieces.splice(span, with.iter().copied());
        self.refresh_starts(first);
    }

    fn refresh_starts(&mut self, first: usize) {
        self.starts.truncate(first);
        let mut offset = match first.checked_sub(1) {
            Some(prev) => self.starts[prev] + self.pieces[prev].len(),
            None => 0,
        };
        for piece in &self.pieces[first..] {
            self.starts.push(offset);
            offset += piece.len();
        }
        self.len = offset;
    }
}
