//! `textcore` - Piece-table text storage engine
//!
//! The in-memory document model of a modal editor: byte-exact, UTF-8-safe
//! text mutation over append-only buffers, a lazily indexed line map,
//! zero-copy reads, bounded undo/redo, and batched change notifications.

// Crate-level lint configuration
#![allow(clippy::module_name_repetitions)] // Allow text::TextView etc
#![allow(clippy::missing_errors_doc)] // Error variants are documented on Error
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::must_use_candidate)] // Accessors are obvious
#![allow(clippy::items_after_statements)] // Common pattern in tests

pub mod error;
pub mod log;
pub mod text;
pub mod unicode;

// Re-export core types at crate root
pub use error::{EncodingReason, Error, Result};
pub use log::{LogLevel, clear_log_callback, emit_log, log_enabled, set_log_callback};
pub use text::{
    AppendBuffer, BatchGuard, BufferOptions, ChangeEvent, ChangeFlags, EditBuffer, EditDelta,
    EditKind, EditOp, History, LineColumn, Piece, PieceTable, SegmentIter, Snapshot, Source,
    SubscriptionId, TextView, UndoEntry,
};
pub use unicode::{Utf8Validator, WidthMethod};
