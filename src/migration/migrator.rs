//! Migration batch runner
//!
//! Items run strictly in original upload order. Each item resolves its
//! entity and type, skips if already migrated (same file name for the same
//! entity and type), copies bytes into the partitioned layout, recomputes
//! the content digest from the copied bytes, and inserts the target row.
//! The dedup rule is intentionally bypassed: migration moves content, it
//! does not create it.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::access_log::{AccessLog, AccessLogEntry, AccessType};
use crate::actor::Actor;
use crate::catalog::DocumentTypeCatalog;
use crate::document::{compute_file_hash, Document, DocumentRepository};
use crate::document::record::storage_path;
use crate::entity::EntityRegistry;
use crate::observability::Logger;
use crate::storage::StorageBackend;

use super::legacy::{EntityDirectory, LegacyDocumentRecord, LegacyStore};

/// Metadata key carrying the legacy row id on migrated documents
pub const LEGACY_ID_KEY: &str = "legacy_document_id";

/// Metadata key carrying the legacy upload timestamp
pub const LEGACY_UPLOADED_AT_KEY: &str = "legacy_uploaded_at";

/// Batch identity recorded in the access log
pub const MIGRATION_ACTOR: &str = "migration-script";

/// Where the batch stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    NotStarted,
    Running,
    Completed,
    CompletedWithErrors,
}

impl MigrationState {
    /// Returns the state string
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationState::NotStarted => "not_started",
            MigrationState::Running => "running",
            MigrationState::Completed => "completed",
            MigrationState::CompletedWithErrors => "completed_with_errors",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One failed item, kept for post-hoc triage
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub legacy_id: i64,
    pub message: String,
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub state: MigrationState,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failures: Vec<ItemFailure>,
}

enum ItemOutcome {
    Migrated,
    Skipped,
}

/// Orchestrates the legacy source against the target subsystem
pub struct Migrator<'a, B: StorageBackend> {
    legacy: &'a LegacyStore,
    directory: &'a dyn EntityDirectory,
    entities: Arc<EntityRegistry>,
    catalog: Arc<DocumentTypeCatalog>,
    repository: Arc<DocumentRepository>,
    backend: &'a B,
    access_log: Arc<dyn AccessLog>,
    state: MigrationState,
}

impl<'a, B: StorageBackend> Migrator<'a, B> {
    /// Create a migrator over both stores
    pub fn new(
        legacy: &'a LegacyStore,
        directory: &'a dyn EntityDirectory,
        entities: Arc<EntityRegistry>,
        catalog: Arc<DocumentTypeCatalog>,
        repository: Arc<DocumentRepository>,
        backend: &'a B,
        access_log: Arc<dyn AccessLog>,
    ) -> Self {
        Self {
            legacy,
            directory,
            entities,
            catalog,
            repository,
            backend,
            access_log,
            state: MigrationState::NotStarted,
        }
    }

    /// Current batch state
    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// Run the batch to completion; item failures never abort the loop
    pub fn run(&mut self) -> MigrationReport {
        self.state = MigrationState::Running;
        let actor = Actor::system(MIGRATION_ACTOR);

        let mut success = 0;
        let mut failed = 0;
        let mut skipped = 0;
        let mut failures = Vec::new();

        for record in self.legacy.active_documents() {
            match self.migrate_item(record, &actor) {
                Ok(ItemOutcome::Migrated) => success += 1,
                Ok(ItemOutcome::Skipped) => skipped += 1,
                Err(message) => {
                    failed += 1;
                    Logger::warn(
                        "migration_item_failed",
                        &[
                            ("legacy_id", &record.id.to_string()),
                            ("error", &message),
                        ],
                    );
                    failures.push(ItemFailure {
                        legacy_id: record.id,
                        message,
                    });
                }
            }
        }

        self.state = if failed > 0 {
            MigrationState::CompletedWithErrors
        } else {
            MigrationState::Completed
        };

        Logger::info(
            "migration_complete",
            &[
                ("success", &success.to_string()),
                ("failed", &failed.to_string()),
                ("skipped", &skipped.to_string()),
            ],
        );

        MigrationReport {
            state: self.state,
            success,
            failed,
            skipped,
            failures,
        }
    }

    fn migrate_item(
        &self,
        record: &LegacyDocumentRecord,
        actor: &Actor,
    ) -> Result<ItemOutcome, String> {
        let entity_name = self
            .directory
            .display_name(&record.entity_type, record.entity_id)
            .unwrap_or_else(|| format!("{} #{}", record.entity_type, record.entity_id));

        let entity = self
            .entities
            .upsert(&record.entity_type, record.entity_id, Some(&entity_name))
            .map_err(|e| e.to_string())?;

        let dtype = self
            .catalog
            .get_by_name(&record.document_type)
            .map_err(|_| format!("unknown document type: {}", record.document_type))?;

        let file_name = record.file_name().to_string();
        if self
            .repository
            .find_by_file_name(&entity.id, &dtype.id, &file_name)
            .is_some()
        {
            return Ok(ItemOutcome::Skipped);
        }

        if !self.legacy.file_exists(&record.file_path) {
            return Err(format!("source file missing: {}", record.file_path));
        }

        let bytes = self.legacy.read_file(&record.file_path).map_err(|e| e.to_string())?;

        let target_path = storage_path(&entity.entity_type, entity.external_entity_id, &file_name);
        self.backend
            .write(&target_path, &bytes)
            .map_err(|e| e.to_string())?;

        // Digest the copied bytes, not the source
        let copied = self.backend.read(&target_path).map_err(|e| e.to_string())?;
        let file_hash = compute_file_hash(&copied);

        // Traceability back to the legacy row
        let mut metadata = serde_json::Map::new();
        metadata.insert(LEGACY_ID_KEY.to_string(), json!(record.id));
        metadata.insert(LEGACY_UPLOADED_AT_KEY.to_string(), json!(record.uploaded_at));

        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            entity_id: entity.id,
            document_type_id: dtype.id,
            document_number: None,
            file_name,
            original_file_name: record.file_name().to_string(),
            file_path: target_path,
            file_size: copied.len() as u64,
            mime_type: record.mime_type.clone(),
            file_hash: Some(file_hash),
            expiry_date: record.expiry_date,
            notes: record.notes.clone(),
            metadata: serde_json::Value::Object(metadata),
            is_verified: record.is_verified,
            verified_by: record.verified_by.clone(),
            verified_at: record.verified_at,
            is_active: true,
            uploaded_at: now,
            updated_at: now,
        };

        self.repository.insert(&document).map_err(|e| e.to_string())?;

        if let Err(e) = self
            .access_log
            .append(&AccessLogEntry::new(document.id, AccessType::Upload, actor))
        {
            Logger::warn(
                "access_log_append_failed",
                &[
                    ("document_id", &document.id.to_string()),
                    ("error", &e.to_string()),
                ],
            );
        }

        Ok(ItemOutcome::Migrated)
    }
}
