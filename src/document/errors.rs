//! Document store errors

use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Document store errors
#[derive(Debug, Error)]
pub enum DocumentError {
    // Policy violations; surfaced, never auto-retried
    #[error("Invalid document type: {0}")]
    DocumentTypeInvalid(String),

    #[error("File too large: {size} bytes (max: {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    /// Same bytes already uploaded for this (entity, type); surfaced
    /// distinctly so callers can say "already uploaded"
    #[error("Duplicate content: an active {type_name} document with identical content already exists for this entity")]
    DuplicateContent { type_name: String },

    #[error("Document not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocumentError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            DocumentError::DocumentTypeInvalid(_) => 400,
            DocumentError::FileTooLarge { .. } => 413,
            DocumentError::UnsupportedMimeType(_) => 415,
            DocumentError::DuplicateContent { .. } => 409,
            DocumentError::NotFound(_) => 404,
            DocumentError::InvalidIdentifier(_) => 400,
            DocumentError::Storage(e) => e.status_code(),
            DocumentError::Internal(_) => 500,
        }
    }
}
