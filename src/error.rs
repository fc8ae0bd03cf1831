//! Error types for text storage operations.

use std::fmt;
use std::io;

/// Result type alias for text storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a piece of text or an offset was rejected as malformed UTF-8.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingReason {
    /// The bytes are not a well-formed UTF-8 sequence.
    InvalidSequence,
    /// The offset lands inside a multi-byte code point.
    SplitsCodePoint,
}

impl fmt::Display for EncodingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSequence => f.write_str("invalid UTF-8 sequence"),
            Self::SplitsCodePoint => f.write_str("offset splits a code point"),
        }
    }
}

/// Error type for text storage operations.
///
/// Every mutating operation that returns an `Error` leaves the buffer exactly
/// as it was before the call.
#[derive(Debug)]
pub enum Error {
    /// Offset past the end of the buffer.
    OutOfBounds { offset: usize, len: usize },
    /// Range is reversed or extends past the end of the buffer.
    InvalidRange { start: usize, end: usize, len: usize },
    /// Line number past the last line.
    LineOutOfBounds { line: usize, line_count: usize },
    /// Malformed UTF-8 input, or an offset inside a code point.
    Encoding {
        offset: usize,
        reason: EncodingReason,
    },
    /// Allocation failed while building the piece list or growing a buffer.
    Capacity { requested: usize },
    /// Snapshot was taken from a different table.
    ForeignSnapshot,
    /// I/O error from a write sink.
    Io(io::Error),
}

impl Error {
    /// True for the bounds family (`OutOfBounds`, `InvalidRange`, `LineOutOfBounds`).
    #[must_use]
    pub const fn is_bounds(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::InvalidRange { .. } | Self::LineOutOfBounds { .. }
        )
    }

    /// True for encoding errors.
    #[must_use]
    pub const fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding { .. })
    }

    pub(crate) const fn invalid_sequence(offset: usize) -> Self {
        Self::Encoding {
            offset,
            reason: EncodingReason::InvalidSequence,
        }
    }

    pub(crate) const fn splits_code_point(offset: usize) -> Self {
        Self::Encoding {
            offset,
            reason: EncodingReason::SplitsCodePoint,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { offset, len } => {
                write!(f, "offset {offset} out of bounds for buffer of length {len}")
            }
            Self::InvalidRange { start, end, len } => {
                write!(f, "invalid range {start}..{end} for buffer of length {len}")
            }
            Self::LineOutOfBounds { line, line_count } => {
                write!(f, "line {line} out of bounds ({line_count} lines)")
            }
            Self::Encoding { offset, reason } => write!(f, "{reason} at byte {offset}"),
            Self::Capacity { requested } => {
                write!(f, "allocation of {requested} more elements failed")
            }
            Self::ForeignSnapshot => f.write_str("snapshot belongs to a different buffer"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
