//! Piece-table text storage and editing.
//!
//! Key types:
//!
//! - [`PieceTable`]: the document as pieces over two append buffers
//! - [`TextView`] and [`SegmentIter`]: zero-copy reads of a piece list
//! - [`Snapshot`]: cheap capture of the piece list for restore or consistent reads
//! - [`EditBuffer`]: a table plus bounded undo/redo and change notifications
//!
//! # Examples
//!
//! ## Piece Table
//!
//! ```
//! use textcore::PieceTable;
//!
//! let mut table = PieceTable::from_text("hello\nworld");
//! table.insert(5, ",")?;
//! assert_eq!(table.line_count(), 2);
//! assert_eq!(table.line_text(0)?, "hello,");
//! assert_eq!(table.slice(7..12)?.as_ref(), b"world");
//! # Ok::<(), textcore::Error>(())
//! ```
//!
//! ## Editable Buffer with Undo
//!
//! ```
//! use textcore::EditBuffer;
//!
//! let mut editor = EditBuffer::new();
//! editor.insert(0, "Hello")?;
//! editor.insert(5, " World")?;
//! assert_eq!(editor.text(), "Hello World");
//!
//! // Undo the last insert
//! editor.undo()?;
//! assert_eq!(editor.text(), "Hello");
//!
//! // Redo brings it back
//! editor.redo()?;
//! assert_eq!(editor.text(), "Hello World");
//! # Ok::<(), textcore::Error>(())
//! ```

mod append;
mod edit;
mod history;
mod lines;
mod notify;
mod piece;
mod segment;
mod table;
mod view;

pub use append::AppendBuffer;
pub use edit::{BatchGuard, BufferOptions, EditBuffer, EditOp};
pub use history::{DEFAULT_HISTORY_CAPACITY, EditDelta, EditKind, History, UndoEntry};
pub use lines::{DEFAULT_LINE_INDEX_STRIDE, LineColumn};
pub use notify::{ChangeEvent, ChangeFlags, SubscriptionId};
pub use piece::{Piece, Source};
pub use segment::SegmentIter;
pub use table::{PieceTable, Snapshot};
pub use view::TextView;
