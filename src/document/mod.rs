//! Document store
//!
//! The core of the subsystem: upload with policy enforcement and
//! content-hash dedup, reads, partial updates with verification stamping,
//! soft/hard deletion, and the audit/access trail emitted alongside every
//! operation.

pub mod errors;
pub mod record;
pub mod repository;
pub mod store;

pub use errors::{DocumentError, DocumentResult};
pub use record::{compute_file_hash, Document, DocumentPatch, DocumentView, UploadRequest};
pub use repository::DocumentRepository;
pub use store::{DocumentContent, DocumentStore, ReadPurpose, UserAuditRecord};
