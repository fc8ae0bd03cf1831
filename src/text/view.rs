//! Read-only access to one piece list.
//!
//! [`TextView`] is what slicing, iteration and boundary checks run on. The
//! live table hands out a view of its current pieces; a
//! [`Snapshot`](crate::Snapshot) hands out a view of the pieces it captured.
//! Both resolve against the same append buffers.

use crate::error::{Error, Result};
use crate::text::append::Buffers;
use crate::text::piece::PieceList;
use crate::text::segment::SegmentIter;
use crate::unicode::{MAX_SEQUENCE_LEN, Utf8Validator};
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::ops::Range;

/// Borrowed, read-only view of document content.
#[derive(Clone, Copy)]
pub struct TextView<'a> {
    buffers: &'a Buffers,
    list: &'a PieceList,
}

impl<'a> TextView<'a> {
    pub(crate) const fn new(buffers: &'a Buffers, list: &'a PieceList) -> Self {
        Self { buffers, list }
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.list.len() == 0
    }

    pub(crate) fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end || range.end > self.len() {
            return Err(Error::InvalidRange {
                start: range.start,
                end: range.end,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Zero-copy segments covering `range`.
    pub fn iterate(&self, range: Range<usize>) -> Result<SegmentIter<'a>> {
        self.check_range(&range)?;
        let (idx, skip) = self.list.locate(range.start);
        Ok(SegmentIter::new(
            self.buffers,
            &self.list.pieces()[idx..],
            skip,
            range.len(),
        ))
    }

    /// Segments covering the whole document.
    #[must_use]
    pub fn segments(&self) -> SegmentIter<'a> {
        SegmentIter::new(self.buffers, self.list.pieces(), 0, self.len())
    }

    /// Bytes in `range`.
    ///
    /// Borrowed straight from the backing buffer when one piece covers the
    /// range; otherwise copied into an owned buffer that lives as long as
    /// the caller keeps it.
    pub fn slice(&self, range: Range<usize>) -> Result<Cow<'a, [u8]>> {
        let len = range.len();
        let mut segments = self.iterate(range)?;
        let Some(first) = segments.next() else {
            return Ok(Cow::Borrowed(&[]));
        };
        if first.len() == len {
            return Ok(Cow::Borrowed(first));
        }
        let mut out = Vec::new();
        out.try_reserve_exact(len)
            .map_err(|_| Error::Capacity { requested: len })?;
        out.extend_from_slice(first);
        for segment in segments {
            out.extend_from_slice(segment);
        }
        Ok(Cow::Owned(out))
    }

    /// Like [`slice`](Self::slice), but multi-piece ranges are composed into
    /// `arena`, which the caller owns and can reuse across calls.
    pub fn slice_in<'b>(&self, range: Range<usize>, arena: &'b mut Vec<u8>) -> Result<&'b [u8]>
    where
        'a: 'b,
    {
        let len = range.len();
        let mut segments = self.iterate(range)?;
        match segments.next() {
            None => Ok(&[]),
            Some(first) if first.len() == len => Ok(first),
            Some(first) => {
                arena.clear();
                arena
                    .try_reserve(len)
                    .map_err(|_| Error::Capacity { requested: len })?;
                arena.extend_from_slice(first);
                for segment in segments {
                    arena.extend_from_slice(segment);
                }
                Ok(arena.as_slice())
            }
        }
    }

    /// Text in `range`, rejecting ranges whose ends split a code point.
    pub fn slice_str(&self, range: Range<usize>) -> Result<Cow<'a, str>> {
        self.check_range(&range)?;
        self.check_boundary(range.start)?;
        self.check_boundary(range.end)?;
        let start = range.start;
        let invalid = |e: std::str::Utf8Error| Error::invalid_sequence(start + e.valid_up_to());
        match self.slice(range)? {
            Cow::Borrowed(bytes) => std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(invalid),
            Cow::Owned(bytes) => String::from_utf8(bytes)
                .map(Cow::Owned)
                .map_err(|e| invalid(e.utf8_error())),
        }
    }

    /// Whether `offset` falls between code points.
    ///
    /// Looks at no more than three bytes on each side of the offset.
    #[must_use]
    pub fn is_char_boundary(&self, offset: usize) -> bool {
        let len = self.len();
        if offset > len {
            return false;
        }
        if offset == 0 || offset == len {
            return true;
        }
        let window = MAX_SEQUENCE_LEN - 1;
        let mut before = [0u8; MAX_SEQUENCE_LEN - 1];
        let mut after = [0u8; MAX_SEQUENCE_LEN - 1];
        let before_start = offset.saturating_sub(window);
        let before_len = self.copy_into(before_start..offset, &mut before);
        let after_len = self.copy_into(offset..len.min(offset + window), &mut after);
        Utf8Validator::is_boundary(&before[..before_len], &after[..after_len])
    }

    pub(crate) fn check_boundary(&self, offset: usize) -> Result<()> {
        if self.is_char_boundary(offset) {
            Ok(())
        } else {
            Err(Error::splits_code_point(offset))
        }
    }

    /// Byte at `offset`, if any.
    #[must_use]
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        if offset >= self.len() {
            return None;
        }
        let (idx, skip) = self.list.locate(offset);
        let piece = self.list.pieces().get(idx)?;
        self.buffers.bytes(piece).get(skip).copied()
    }

    /// Number of `\n` bytes in `range`.
    pub fn count_newlines(&self, range: Range<usize>) -> Result<usize> {
        Ok(self
            .iterate(range)?
            .map(Utf8Validator::count_newlines)
            .sum())
    }

    /// Stream the whole document into `writer` segment by segment.
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> Result<()> {
        for segment in self.segments() {
            writer.write_all(segment)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn copy_into(&self, range: Range<usize>, out: &mut [u8]) -> usize {
        let mut n = 0;
        for segment in self.iterate(range).into_iter().flatten() {
            let take = segment.len().min(out.len() - n);
            out[n..n + take].copy_from_slice(&segment[..take]);
            n += take;
        }
        n
    }
}

impl fmt::Display for TextView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.segments() {
            match std::str::from_utf8(segment) {
                Ok(s) => f.write_str(s)?,
                Err(_) => f.write_str(&String::from_utf8_lossy(segment))?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TextView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextView")
            .field("len", &self.len())
            .field("pieces", &self.list.pieces().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::piece::{Piece, Source};

    /// "héllo\nwörld" split across three pieces.
    fn fixture() -> (Buffers, PieceList) {
        let mut buffers = Buffers::new("héllo\nw".as_bytes().to_vec());
        let added = buffers.append("örld".as_bytes()).unwrap();
        let mut list = PieceList::single(Piece::new(Source::Original, 0, 4));
        list.splice(
            1..1,
            &[
                Piece::new(Source::Original, 4, 4),
                Piece::new(Source::Added, added.start, added.len()),
            ],
        );
        (buffers, list)
    }

    #[test]
    fn test_display_and_len() {
        let (buffers, list) = fixture();
        let view = TextView::new(&buffers, &list);
        assert_eq!(view.len(), "héllo\nwörld".len());
        assert_eq!(view.to_string(), "héllo\nwörld");
    }

    #[test]
    fn test_slice_in_reuses_arena() {
        let (buffers, list) = fixture();
        let view = TextView::new(&buffers, &list);
        let mut arena = Vec::with_capacity(64);
        assert_eq!(view.slice_in(3..8, &mut arena).unwrap(), "llo\nw".as_bytes());
        assert_eq!(view.slice_in(0..2, &mut arena).unwrap(), b"h\xC3");
        assert_eq!(view.slice_in(9..9, &mut arena).unwrap(), b"");
        assert!(view.slice_in(5..99, &mut arena).unwrap_err().is_bounds());
    }

    #[test]
    fn test_point_queries() {
        let (buffers, list) = fixture();
        let view = TextView::new(&buffers, &list);
        assert_eq!(view.byte_at(0), Some(b'h'));
        assert_eq!(view.byte_at(6), Some(b'\n'));
        assert_eq!(view.byte_at(view.len()), None);
        assert_eq!(view.count_newlines(0..view.len()).unwrap(), 1);
        assert!(!view.is_char_boundary(2));
        assert!(view.is_char_boundary(3));
        assert!(!view.is_char_boundary(view.len() + 1));
    }
}
