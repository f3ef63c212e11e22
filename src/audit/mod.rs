//! Audit logging
//!
//! Append-only structured diff log for mutating document operations:
//! who changed what and when, including before/after snapshots and the
//! list of changed fields. Queryable by document, user, and time window.

pub mod entry;
pub mod log;

pub use entry::{AuditLogEntry, AuditOperation};
pub use log::{AuditLog, OperationStats};
