//! Search errors

use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Search errors; all are malformed-filter validation failures
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Unknown document type in filter: {0}")]
    UnknownTypeName(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}

impl SearchError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            SearchError::UnknownTypeName(_) => 400,
            SearchError::InvalidFilter(_) => 400,
        }
    }
}
