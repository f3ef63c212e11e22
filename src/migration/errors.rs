//! Migration errors
//!
//! These cover reading the legacy store itself; per-item failures during a
//! run are collected in the report instead of being raised.

use thiserror::Error;

/// Result type for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Invalid legacy manifest: {0}")]
    Manifest(String),

    #[error("I/O error: {0}")]
    Io(String),
}
