//! Table-driven UTF-8 validation and code-point boundary checks.
//!
//! Every byte that enters the added buffer passes [`Utf8Validator::validate`],
//! and every edit offset passes [`Utf8Validator::is_boundary`]. Both are driven
//! by a single 256-entry table keyed by the byte value.

/// Marker for a continuation byte (`10xxxxxx`).
const CONT: u8 = 0;
/// Marker for a byte that can never appear in well-formed UTF-8.
const INVALID: u8 = 0xFF;

/// Expected sequence length for each possible leading byte.
static SEQUENCE_LEN: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = match i as u8 {
            0x00..=0x7F => 1,
            0x80..=0xBF => CONT,
            // 0xC0 and 0xC1 would only encode overlong ASCII.
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => INVALID,
        };
        i += 1;
    }
    table
}

/// Longest UTF-8 sequence, and so the widest window a boundary check needs.
pub const MAX_SEQUENCE_LEN: usize = 4;

/// Stateless UTF-8 checks.
#[derive(Debug, Clone, Copy)]
pub struct Utf8Validator;

impl Utf8Validator {
    /// Sequence length announced by a leading byte, or `None` for continuation
    /// and never-valid bytes.
    #[inline]
    #[must_use]
    pub fn sequence_len(lead: u8) -> Option<usize> {
        match SEQUENCE_LEN[usize::from(lead)] {
            CONT | INVALID => None,
            n => Some(usize::from(n)),
        }
    }

    /// True for `10xxxxxx` bytes.
    #[inline]
    #[must_use]
    pub fn is_continuation(byte: u8) -> bool {
        SEQUENCE_LEN[usize::from(byte)] == CONT
    }

    /// Check that `bytes` is well-formed UTF-8.
    ///
    /// On failure returns the length of the longest valid prefix, which is
    /// also the byte index of the first offending sequence. Rejects overlong
    /// encodings, surrogates and code points above U+10FFFF, matching
    /// [`std::str::from_utf8`].
    pub fn validate(bytes: &[u8]) -> Result<(), usize> {
        let mut i = 0;
        while i < bytes.len() {
            let lead = bytes[i];
            if lead < 0x80 {
                i += 1;
                continue;
            }
            let Some(len) = Self::sequence_len(lead) else {
                return Err(i);
            };
            if i + len > bytes.len() {
                return Err(i);
            }
            let second = bytes[i + 1];
            let second_ok = match lead {
                0xE0 => (0xA0..=0xBF).contains(&second),
                0xED => (0x80..=0x9F).contains(&second),
                0xF0 => (0x90..=0xBF).contains(&second),
                0xF4 => (0x80..=0x8F).contains(&second),
                _ => Self::is_continuation(second),
            };
            if !second_ok {
                return Err(i);
            }
            if !bytes[i + 2..i + len].iter().all(|&b| Self::is_continuation(b)) {
                return Err(i);
            }
            i += len;
        }
        Ok(())
    }

    /// Decide whether an offset sits between code points, given the bytes
    /// around it.
    ///
    /// `before` holds up to three bytes immediately preceding the offset (in
    /// document order) and `after` the bytes following it. An empty side
    /// means the offset is at that end of the document. Three bytes back is
    /// enough to find the leading byte of any sequence the offset could be
    /// inside.
    #[must_use]
    pub fn is_boundary(before: &[u8], after: &[u8]) -> bool {
        if after.first().is_some_and(|&b| Self::is_continuation(b)) {
            return false;
        }
        let window = &before[before.len().saturating_sub(MAX_SEQUENCE_LEN - 1)..];
        for (distance, &byte) in window.iter().rev().enumerate() {
            if Self::is_continuation(byte) {
                continue;
            }
            // `distance + 1` bytes of this sequence precede the offset.
            return Self::sequence_len(byte).is_none_or(|len| len <= distance + 1);
        }
        true
    }

    /// Boundary check on a contiguous slice.
    #[must_use]
    pub fn is_char_boundary(bytes: &[u8], index: usize) -> bool {
        if index > bytes.len() {
            return false;
        }
        let before = &bytes[index.saturating_sub(MAX_SEQUENCE_LEN - 1)..index];
        let after = &bytes[index..bytes.len().min(index + MAX_SEQUENCE_LEN - 1)];
        Self::is_boundary(before, after)
    }

    /// Number of `\n` bytes in `bytes`.
    #[inline]
    #[must_use]
    pub fn count_newlines(bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| b == b'\n').count()
    }
}
