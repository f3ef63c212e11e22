//! Legacy store migration
//!
//! One-time batch that transplants documents from a legacy store into this
//! subsystem. Items are processed in original upload order, failures are
//! isolated per item, and re-runs are idempotent through a filename-based
//! existence check. A separate verification pass confirms counts and that
//! every migrated file resolves on disk.

pub mod errors;
pub mod legacy;
pub mod migrator;
pub mod verifier;

pub use errors::{MigrationError, MigrationResult};
pub use legacy::{EntityDirectory, LegacyDocumentRecord, LegacyStore, StaticEntityDirectory};
pub use migrator::{MigrationReport, MigrationState, Migrator};
pub use verifier::{verify, VerificationReport};
