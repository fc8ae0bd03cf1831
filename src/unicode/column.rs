//! Column measurement for line prefixes.
//!
//! The line index reports byte columns. Editors usually also want the
//! user-perceived column (grapheme clusters) and the rendered column (cells,
//! with tab stops). Both are measured here over the text between a line start
//! and an offset.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Width calculation method for ambiguous-width characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WidthMethod {
    /// POSIX-like wcwidth: ambiguous width = 1.
    #[default]
    WcWidth,
    /// Unicode East Asian Width: ambiguous width = 2.
    Unicode,
}

impl WidthMethod {
    fn width(self, s: &str) -> usize {
        match self {
            Self::WcWidth => UnicodeWidthStr::width(s),
            Self::Unicode => UnicodeWidthStr::width_cjk(s),
        }
    }
}

/// Number of grapheme clusters in a line prefix.
#[must_use]
pub fn grapheme_column(prefix: &str) -> usize {
    if prefix.is_ascii() {
        return prefix.len();
    }
    prefix.graphemes(true).count()
}

/// Rendered column of the end of a line prefix.
///
/// Tabs advance to the next multiple of `tab_width` (a width of 0 is treated
/// as 1).
#[must_use]
pub fn display_column(prefix: &str, tab_width: usize, method: WidthMethod) -> usize {
    let tab_width = tab_width.max(1);
    let mut col = 0;
    for grapheme in prefix.graphemes(true) {
        col += if grapheme == "\t" {
            tab_width - (col % tab_width)
        } else {
            method.width(grapheme)
        };
    }
    col
}
