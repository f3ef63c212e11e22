//! Catalog errors

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Document type catalog errors
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Unknown or inactive type name
    #[error("Document type not found: {0}")]
    TypeNotFound(String),
}

impl CatalogError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::TypeNotFound(_) => 404,
        }
    }
}
