//! Line index layered on the piece table.
//!
//! The newline count is kept exact on every edit by scanning only the
//! inserted or removed bytes. Line-start lookups use a sparse list of
//! checkpoints (the byte offset of every `stride`-th line start). The list is
//! dropped on every mutation and rebuilt in one pass by the first line query
//! that follows, so keystrokes never pay for it.

use crate::error::{Error, Result};
use crate::log::log_debug;
use crate::text::view::TextView;
use std::ops::Range;
use std::sync::OnceLock;

/// Default number of lines between checkpoints.
pub const DEFAULT_LINE_INDEX_STRIDE: usize = 64;

/// A position expressed as zero-based line and byte column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineColumn {
    pub line: usize,
    /// Bytes from the start of the line.
    pub column: usize,
}

impl LineColumn {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct LineIndex {
    newlines: usize,
    stride: usize,
    checkpoints: OnceLock<Vec<usize>>,
}

impl LineIndex {
    pub(crate) fn new(newlines: usize, stride: usize) -> Self {
        Self {
            newlines,
            stride: stride.max(1),
            checkpoints: OnceLock::new(),
        }
    }

    /// Lines in the document. An empty document has one empty line.
    pub(crate) const fn line_count(&self) -> usize {
        self.newlines + 1
    }

    pub(crate) const fn newlines(&self) -> usize {
        self.newlines
    }

    pub(crate) const fn stride(&self) -> usize {
        self.stride
    }

    pub(crate) fn set_stride(&mut self, stride: usize) {
        self.stride = stride.max(1);
        self.invalidate();
    }

    pub(crate) fn on_insert(&mut self, added_newlines: usize) {
        self.newlines += added_newlines;
        self.invalidate();
    }

    pub(crate) fn on_delete(&mut self, removed_newlines: usize) {
        self.newlines -= removed_newlines;
        self.invalidate();
    }

    pub(crate) fn reset(&mut self, newlines: usize) {
        self.newlines = newlines;
        self.invalidate();
    }

    pub(crate) fn invalidate(&mut self) {
        self.checkpoints.take();
    }

    #[cfg(test)]
    pub(crate) fn is_built(&self) -> bool {
        self.checkpoints.get().is_some()
    }

    fn checkpoints(&self, view: &TextView<'_>) -> &[usize] {
        self.checkpoints.get_or_init(|| {
            let checkpoints = build_checkpoints(view, self.stride);
            log_debug!(
                "line index rebuilt: {} lines, {} checkpoints",
                self.line_count(),
                checkpoints.len()
            );
            checkpoints
        })
    }

    fn check_line(&self, line: usize) -> Result<()> {
        if line >= self.line_count() {
            return Err(Error::LineOutOfBounds {
                line,
                line_count: self.line_count(),
            });
        }
        Ok(())
    }

    /// Byte offset where `line` starts.
    pub(crate) fn line_start(&self, view: &TextView<'_>, line: usize) -> Result<usize> {
        self.check_line(line)?;
        let checkpoint = self.checkpoints(view)[line / self.stride];
        let mut remaining = line % self.stride;
        if remaining == 0 {
            return Ok(checkpoint);
        }
        let mut pos = checkpoint;
        for segment in view.iterate(checkpoint..view.len())? {
            for (i, &b) in segment.iter().enumerate() {
                if b == b'\n' {
                    remaining -= 1;
                    if remaining == 0 {
                        return Ok(pos + i + 1);
                    }
                }
            }
            pos += segment.len();
        }
        // The cached newline count promised this line exists.
        Err(Error::LineOutOfBounds {
            line,
            line_count: self.line_count(),
        })
    }

    /// Byte range of `line`, without its terminating `\n`.
    pub(crate) fn line_range(&self, view: &TextView<'_>, line: usize) -> Result<Range<usize>> {
        let start = self.line_start(view, line)?;
        Ok(start..line_end(view, start)?)
    }

    /// Line containing `offset` and the offset where that line starts.
    pub(crate) fn locate(&self, view: &TextView<'_>, offset: usize) -> Result<(usize, usize)> {
        if offset > view.len() {
            return Err(Error::OutOfBounds {
                offset,
                len: view.len(),
            });
        }
        let checkpoints = self.checkpoints(view);
        let k = checkpoints.partition_point(|&c| c <= offset).saturating_sub(1);
        let mut line = k * self.stride;
        let mut line_start = checkpoints[k];
        let mut pos = line_start;
        for segment in view.iterate(line_start..offset)? {
            for (i, &b) in segment.iter().enumerate() {
                if b == b'\n' {
                    line += 1;
                    line_start = pos + i + 1;
                }
            }
            pos += segment.len();
        }
        Ok((line, line_start))
    }
}

/// Offset of the first `\n` at or after `start`, or the document length.
fn line_end(view: &TextView<'_>, start: usize) -> Result<usize> {
    let mut pos = start;
    for segment in view.iterate(start..view.len())? {
        if let Some(i) = segment.iter().position(|&b| b == b'\n') {
            return Ok(pos + i);
        }
        pos += segment.len();
    }
    Ok(pos)
}

fn build_checkpoints(view: &TextView<'_>, stride: usize) -> Vec<usize> {
    let mut checkpoints = vec![0];
    let mut line = 0;
    let mut pos = 0;
    for segment in view.segments() {
        for (i, &b) in segment.iter().enumerate() {
            if b == b'\n' {
                line += 1;
                if line % stride == 0 {
                    checkpoints.push(pos + i + 1);
                }
            }
        }
        pos += segment.len();
    }
    checkpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::append::Buffers;
    use crate::text::piece::{Piece, PieceList, Source};

    fn view_of(text: &str) -> (Buffers, PieceList) {
        let buffers = Buffers::new(text.as_bytes().to_vec());
        let list = PieceList::single(Piece::new(Source::Original, 0, text.len()));
        (buffers, list)
    }

    #[test]
    fn test_line_ranges_across_checkpoints() {
        let text: String = (0..10).map(|i| format!("line{i}\n")).collect();
        let (buffers, list) = view_of(&text);
        let view = TextView::new(&buffers, &list);
        let index = LineIndex::new(10, 3);

        assert_eq!(index.line_count(), 11);
        for line in 0..10 {
            let range = index.line_range(&view, line).unwrap();
            assert_eq!(&text[range], format!("line{line}"));
        }
        // Trailing empty line after the final newline.
        assert_eq!(index.line_range(&view, 10).unwrap(), text.len()..text.len());
        assert!(index.line_range(&view, 11).unwrap_err().is_bounds());
    }

    #[test]
    fn test_locate_offsets() {
        let text = "ab\ncd\n\nef";
        let (buffers, list) = view_of(text);
        let view = TextView::new(&buffers, &list);
        let index = LineIndex::new(3, 2);

        assert_eq!(index.locate(&view, 0).unwrap(), (0, 0));
        assert_eq!(index.locate(&view, 2).unwrap(), (0, 0));
        assert_eq!(index.locate(&view, 3).unwrap(), (1, 3));
        assert_eq!(index.locate(&view, 6).unwrap(), (2, 6));
        assert_eq!(index.locate(&view, 7).unwrap(), (3, 7));
        assert_eq!(index.locate(&view, 9).unwrap(), (3, 7));
        assert!(index.locate(&view, 10).unwrap_err().is_bounds());
    }

    #[test]
    fn test_checkpoints_are_lazy() {
        let (buffers, list) = view_of("a\nb\nc");
        let view = TextView::new(&buffers, &list);
        let mut index = LineIndex::new(2, 1);
        assert!(!index.is_built());
        index.line_start(&view, 1).unwrap();
        assert!(index.is_built());
        index.on_insert(0);
        assert!(!index.is_built());
    }
}
