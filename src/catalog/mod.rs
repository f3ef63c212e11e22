//! Document type catalog
//!
//! Static, read-only registry of allowed document types and their upload
//! policy (MIME allow-list, size limit). Seeded once at startup and
//! immutable at runtime.

pub mod catalog;
pub mod errors;
pub mod types;

pub use catalog::DocumentTypeCatalog;
pub use errors::{CatalogError, CatalogResult};
pub use types::{DocumentType, DocumentTypeSeed};
