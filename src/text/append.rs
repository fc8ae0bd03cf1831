//! Grow-only byte stores backing the piece table.
//!
//! Bytes written to an [`AppendBuffer`] are never moved or overwritten from
//! the point of view of a piece: a piece stores offsets, not pointers, so a
//! reallocation of the underlying `Vec` is invisible to it. This is what
//! keeps old snapshots valid forever.

use crate::error::{Error, Result};
use crate::text::piece::{Piece, Source};
use std::ops::Range;
use std::sync::Arc;

/// Grow-only byte store.
#[derive(Clone, Debug, Default)]
pub struct AppendBuffer {
    bytes: Vec<u8>,
}

impl AppendBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Append bytes and return the range they now occupy.
    ///
    /// Fails with [`Error::Capacity`] if the allocation cannot grow; the
    /// buffer is unchanged in that case.
    pub fn push(&mut self, data: &[u8]) -> Result<Range<usize>> {
        self.bytes
            .try_reserve(data.len())
            .map_err(|_| Error::Capacity {
                requested: data.len(),
            })?;
        let start = self.bytes.len();
        self.bytes.extend_from_slice(data);
        Ok(start..self.bytes.len())
    }

    #[must_use]
    pub fn get(&self, range: Range<usize>) -> &[u8] {
        &self.bytes[range]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The two stores a piece can reference.
#[derive(Clone, Debug, Default)]
pub(crate) struct Buffers {
    /// Loaded content. Shared between clones; never written after load.
    original: Arc<[u8]>,
    added: AppendBuffer,
}

impl Buffers {
    pub(crate) fn new(original: Vec<u8>) -> Self {
        Self {
            original: original.into(),
            added: AppendBuffer::new(),
        }
    }

    pub(crate) fn original_len(&self) -> usize {
        self.original.len()
    }

    pub(crate) fn added(&self) -> &AppendBuffer {
        &self.added
    }

    pub(crate) fn append(&mut self, data: &[u8]) -> Result<Range<usize>> {
        self.added.push(data)
    }

    /// Bytes a piece refers to.
    pub(crate) fn bytes(&self, piece: &Piece) -> &[u8] {
        let range = piece.start()..piece.end();
        match piece.source() {
            Source::Original => &self.original[range],
            Source::Added => self.added.get(range),
        }
    }
}
