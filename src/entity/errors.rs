//! Entity registry errors

use thiserror::Error;

/// Result type for entity operations
pub type EntityResult<T> = Result<T, EntityError>;

/// Entity registry errors
#[derive(Debug, Clone, Error)]
pub enum EntityError {
    #[error("Entity not found: {entity_type} #{external_entity_id}")]
    NotFound {
        entity_type: String,
        external_entity_id: i64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EntityError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            EntityError::NotFound { .. } => 404,
            EntityError::Internal(_) => 500,
        }
    }
}
