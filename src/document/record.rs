//! Document row model and helpers

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A stored document row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub document_type_id: Uuid,
    /// Optional business identifier, e.g. a PAN or GST number
    pub document_number: Option<String>,
    /// Generated storage name
    pub file_name: String,
    pub original_file_name: String,
    /// Relative path under the storage root
    pub file_path: String,
    pub file_size: u64,
    pub mime_type: String,
    /// SHA-256 hex digest of the raw bytes
    pub file_hash: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Opaque structured blob owned by the caller
    pub metadata: Value,
    pub is_verified: bool,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    /// Soft-delete flag
    pub is_active: bool,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Full row snapshot for audit entries
    pub fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A document joined with its type and entity display fields
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: Document,
    pub type_name: String,
    pub type_display_name: String,
    pub category: String,
    pub entity_type: String,
    pub external_entity_id: i64,
    pub entity_name: Option<String>,
}

/// Everything an upload needs, as received from the boundary
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub entity_type: String,
    pub external_entity_id: i64,
    pub entity_name: Option<String>,
    pub type_name: String,
    pub document_number: Option<String>,
    pub original_file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub expiry_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub metadata: Option<Value>,
}

/// Partial update of the mutable document fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPatch {
    pub document_number: Option<String>,
    pub is_verified: Option<bool>,
    pub verified_by: Option<String>,
    pub notes: Option<String>,
    pub metadata: Option<Value>,
}

impl DocumentPatch {
    /// True when no field is supplied
    pub fn is_empty(&self) -> bool {
        self.document_number.is_none()
            && self.is_verified.is_none()
            && self.verified_by.is_none()
            && self.notes.is_none()
            && self.metadata.is_none()
    }
}

/// SHA-256 hex digest over raw bytes
pub fn compute_file_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Generate a collision-resistant storage filename:
/// `<type>_<timestamp>_<random>.<ext>`
pub fn generate_file_name(type_name: &str, original_file_name: &str) -> String {
    let extension = Path::new(original_file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());

    format!(
        "{}_{}_{:08x}.{}",
        type_name,
        Utc::now().format("%Y%m%d%H%M%S"),
        rand::random::<u32>(),
        extension
    )
}

/// Relative storage path partitioned by entity
pub fn storage_path(entity_type: &str, external_entity_id: i64, file_name: &str) -> String {
    format!("{}/{}/{}", entity_type, external_entity_id, file_name)
}
