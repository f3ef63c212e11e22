//! Legacy store access (read-only)
//!
//! The legacy store is a JSON manifest of document rows plus a readable
//! file tree rooted at a known path. Nothing here is ever written.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::errors::{MigrationError, MigrationResult};

/// A document row as the legacy system recorded it
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyDocumentRecord {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub document_type: String,
    /// Relative path under the legacy root
    pub file_path: String,
    pub file_size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl LegacyDocumentRecord {
    /// The bare file name, used for the idempotency check
    pub fn file_name(&self) -> &str {
        self.file_path.rsplit('/').next().unwrap_or(&self.file_path)
    }
}

/// Read-only handle on the legacy store
pub struct LegacyStore {
    root: PathBuf,
    records: Vec<LegacyDocumentRecord>,
}

impl LegacyStore {
    /// Load the manifest and remember the file tree root
    pub fn open(manifest: &Path, root: &Path) -> MigrationResult<Self> {
        let contents = fs::read_to_string(manifest).map_err(|e| {
            MigrationError::Io(format!("read {}: {}", manifest.display(), e))
        })?;
        let records: Vec<LegacyDocumentRecord> = serde_json::from_str(&contents)
            .map_err(|e| MigrationError::Manifest(e.to_string()))?;

        Ok(Self {
            root: root.to_path_buf(),
            records,
        })
    }

    /// Active rows in original upload order
    pub fn active_documents(&self) -> Vec<&LegacyDocumentRecord> {
        let mut documents: Vec<&LegacyDocumentRecord> =
            self.records.iter().filter(|r| r.is_active).collect();
        documents.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));
        documents
    }

    /// Number of active rows
    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_active).count()
    }

    /// Check whether a legacy file exists
    pub fn file_exists(&self, file_path: &str) -> bool {
        self.root.join(file_path).exists()
    }

    /// Read a legacy file in full
    pub fn read_file(&self, file_path: &str) -> MigrationResult<Vec<u8>> {
        let full_path = self.root.join(file_path);
        fs::read(&full_path)
            .map_err(|e| MigrationError::Io(format!("read {}: {}", full_path.display(), e)))
    }
}

/// Display-name lookup against the external entity directory.
///
/// A miss is non-fatal; the caller synthesizes a label instead.
pub trait EntityDirectory: Send + Sync {
    fn display_name(&self, entity_type: &str, external_entity_id: i64) -> Option<String>;
}

/// One directory entry as loaded from file
#[derive(Debug, Clone, Deserialize)]
struct DirectoryEntry {
    entity_type: String,
    external_entity_id: i64,
    name: String,
}

/// Directory backed by a static list (loaded from a JSON file)
pub struct StaticEntityDirectory {
    entries: Vec<DirectoryEntry>,
}

impl StaticEntityDirectory {
    /// An empty directory; every lookup misses
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Load entries from a JSON file
    pub fn from_file(path: &Path) -> MigrationResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| MigrationError::Io(format!("read {}: {}", path.display(), e)))?;
        let entries: Vec<DirectoryEntry> = serde_json::from_str(&contents)
            .map_err(|e| MigrationError::Manifest(e.to_string()))?;
        Ok(Self { entries })
    }
}

impl EntityDirectory for StaticEntityDirectory {
    fn display_name(&self, entity_type: &str, external_entity_id: i64) -> Option<String> {
        self.entries
            .iter()
            .find(|e| e.entity_type == entity_type && e.external_entity_id == external_entity_id)
            .map(|e| e.name.clone())
    }
}
