//! UTF-8 boundary validation and column measurement.

mod column;
mod utf8;

pub use column::{WidthMethod, display_column, grapheme_column};
pub use utf8::{MAX_SEQUENCE_LEN, Utf8Validator};
