//! Access logging
//!
//! Append-only record of every touch to a document (view, download,
//! upload, update, delete), independent of whether any field changed.
//! Entries are immutable once written; there is no update or delete
//! surface.

pub mod entry;
pub mod log;

pub use entry::{AccessLogEntry, AccessType};
pub use log::{AccessLog, FileAccessLog, MemoryAccessLog};
