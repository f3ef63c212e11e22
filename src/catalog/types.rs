//! Document type definitions and upload policy checks

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An allowed document type with its upload policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: Uuid,
    /// Unique key, e.g. "pan_card"
    pub type_name: String,
    pub display_name: String,
    pub category: String,
    /// Allowed MIME types; exact match or "prefix/*" wildcard. Empty = all.
    pub allowed_mime_types: Vec<String>,
    /// Maximum file size in bytes (0 = unlimited)
    pub max_file_size: u64,
    pub is_active: bool,
}

/// Seed form of a document type, as it appears in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTypeSeed {
    pub type_name: String,
    pub display_name: String,
    pub category: String,
    #[serde(default)]
    pub allowed_mime_types: Vec<String>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024 // 50MB
}

fn default_true() -> bool {
    true
}

impl DocumentType {
    /// Materialize a seed into a runtime type
    pub fn from_seed(seed: DocumentTypeSeed) -> Self {
        Self {
            id: Uuid::new_v4(),
            type_name: seed.type_name,
            display_name: seed.display_name,
            category: seed.category,
            allowed_mime_types: seed.allowed_mime_types,
            max_file_size: seed.max_file_size,
            is_active: seed.is_active,
        }
    }

    /// Check if a MIME type is in the allow-list
    pub fn is_mime_allowed(&self, mime: &str) -> bool {
        if self.allowed_mime_types.is_empty() {
            return true;
        }

        for allowed in &self.allowed_mime_types {
            if let Some(prefix) = allowed.strip_suffix("/*") {
                if mime.starts_with(prefix) && mime[prefix.len()..].starts_with('/') {
                    return true;
                }
            } else if allowed == mime {
                return true;
            }
        }

        false
    }

    /// Check the size limit
    pub fn allows_size(&self, size: u64) -> bool {
        self.max_file_size == 0 || size <= self.max_file_size
    }
}
