//! Document store operations
//!
//! Every write resolves the document type and entity first, then touches
//! storage, then the row, then the logs. Policy failures leave no row and
//! no file behind. Log sinks are best-effort: a failed append is reported
//! as a WARN event and never rolls back the operation it belongs to.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::access_log::{AccessLog, AccessLogEntry, AccessType};
use crate::actor::Actor;
use crate::audit::{AuditLog, AuditLogEntry, AuditOperation, OperationStats};
use crate::catalog::DocumentTypeCatalog;
use crate::entity::{EntityError, EntityRegistry};
use crate::observability::Logger;
use crate::storage::StorageBackend;

use super::errors::{DocumentError, DocumentResult};
use super::record::{
    compute_file_hash, generate_file_name, storage_path, Document, DocumentPatch, DocumentView,
    UploadRequest,
};
use super::repository::DocumentRepository;

/// Why a read is being made; decides the access log entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPurpose {
    View,
    Download,
}

impl ReadPurpose {
    fn access_type(&self) -> AccessType {
        match self {
            ReadPurpose::View => AccessType::View,
            ReadPurpose::Download => AccessType::Download,
        }
    }
}

/// A document plus its bytes, as returned to the retrieval boundary
pub struct DocumentContent {
    pub document: DocumentView,
    pub bytes: Vec<u8>,
}

/// One user-trail record: the audit entry joined with document display
/// fields (absent when the row was hard-deleted)
#[derive(Debug, Clone, Serialize)]
pub struct UserAuditRecord {
    #[serde(flatten)]
    pub entry: AuditLogEntry,
    pub original_file_name: Option<String>,
    pub type_name: Option<String>,
}

/// The document store
pub struct DocumentStore<B: StorageBackend> {
    entities: Arc<EntityRegistry>,
    catalog: Arc<DocumentTypeCatalog>,
    repository: Arc<DocumentRepository>,
    backend: B,
    access_log: Arc<dyn AccessLog>,
    audit_log: Arc<AuditLog>,
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("valid pattern"))
}

impl<B: StorageBackend> DocumentStore<B> {
    /// Create a store over its collaborators
    pub fn new(
        entities: Arc<EntityRegistry>,
        catalog: Arc<DocumentTypeCatalog>,
        repository: Arc<DocumentRepository>,
        backend: B,
        access_log: Arc<dyn AccessLog>,
        audit_log: Arc<AuditLog>,
    ) -> Self {
        Self {
            entities,
            catalog,
            repository,
            backend,
            access_log,
            audit_log,
        }
    }

    /// Upload a document.
    ///
    /// Policy checks run before any byte reaches disk; the bytes land in a
    /// temp slot, the row is inserted, and only then is the file promoted
    /// into its final partitioned path. A failure at any step before the
    /// promote leaves no row and no file.
    pub fn upload(&self, request: UploadRequest, actor: &Actor) -> DocumentResult<DocumentView> {
        if !identifier_pattern().is_match(&request.entity_type) {
            return Err(DocumentError::InvalidIdentifier(request.entity_type.clone()));
        }

        let dtype = self
            .catalog
            .get_by_name(&request.type_name)
            .map_err(|_| DocumentError::DocumentTypeInvalid(request.type_name.clone()))?;

        let size = request.bytes.len() as u64;
        if !dtype.allows_size(size) {
            return Err(DocumentError::FileTooLarge {
                size,
                max: dtype.max_file_size,
            });
        }
        if !dtype.is_mime_allowed(&request.mime_type) {
            return Err(DocumentError::UnsupportedMimeType(request.mime_type.clone()));
        }

        let entity = self
            .entities
            .upsert(
                &request.entity_type,
                request.external_entity_id,
                request.entity_name.as_deref(),
            )
            .map_err(|e| DocumentError::Internal(e.to_string()))?;

        let file_hash = compute_file_hash(&request.bytes);
        if self
            .repository
            .find_active_by_hash(&entity.id, &dtype.id, &file_hash)
            .is_some()
        {
            return Err(DocumentError::DuplicateContent {
                type_name: dtype.type_name.clone(),
            });
        }

        let file_name = generate_file_name(&dtype.type_name, &request.original_file_name);
        let file_path = storage_path(&entity.entity_type, entity.external_entity_id, &file_name);

        let temp = self.backend.write_temp(&request.bytes)?;

        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            entity_id: entity.id,
            document_type_id: dtype.id,
            document_number: request.document_number,
            file_name,
            original_file_name: request.original_file_name,
            file_path: file_path.clone(),
            file_size: size,
            mime_type: request.mime_type,
            file_hash: Some(file_hash),
            expiry_date: request.expiry_date,
            notes: request.notes,
            metadata: request.metadata.unwrap_or_else(|| Value::Object(Default::default())),
            is_verified: false,
            verified_by: None,
            verified_at: None,
            is_active: true,
            uploaded_at: now,
            updated_at: now,
        };

        if let Err(e) = self.repository.insert(&document) {
            let _ = self.backend.discard(&temp);
            return Err(e);
        }

        if let Err(e) = self.backend.promote(&temp, &file_path) {
            // Row without a file is worse than no upload at all
            let _ = self.repository.remove(&document.id);
            let _ = self.backend.discard(&temp);
            self.record_access(
                AccessLogEntry::new(document.id, AccessType::Upload, actor)
                    .with_error(e.to_string()),
            );
            return Err(e.into());
        }

        self.record_access(AccessLogEntry::new(document.id, AccessType::Upload, actor));
        self.record_audit(
            AuditLogEntry::new(document.id, AuditOperation::Create, actor)
                .with_new_values(document.snapshot()),
        );

        self.view(document)
    }

    /// Fetch an active document joined with display fields
    pub fn get(&self, document_id: Uuid) -> DocumentResult<DocumentView> {
        let document = self
            .repository
            .get_active(&document_id)
            .ok_or(DocumentError::NotFound(document_id))?;
        self.view(document)
    }

    /// Active documents for an entity, newest first, optionally narrowed
    /// to one type
    pub fn list_by_entity(
        &self,
        entity_type: &str,
        external_entity_id: i64,
        type_name: Option<&str>,
    ) -> DocumentResult<Vec<DocumentView>> {
        let type_id = match type_name {
            Some(name) => Some(
                self.catalog
                    .get_by_name(name)
                    .map_err(|_| DocumentError::DocumentTypeInvalid(name.to_string()))?
                    .id,
            ),
            None => None,
        };

        let entity = match self.entities.lookup(entity_type, external_entity_id) {
            Ok(entity) => entity,
            Err(EntityError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(DocumentError::Internal(e.to_string())),
        };

        self.repository
            .list_for_entity(&entity.id, type_id)
            .into_iter()
            .map(|d| self.view(d))
            .collect()
    }

    /// Partial update of the mutable fields.
    ///
    /// A transition of `is_verified` stamps `verified_by`/`verified_at`
    /// and tags the audit operation Verify/Unverify. The entry's
    /// `changed_fields` is the diff against the pre-update snapshot.
    pub fn update(
        &self,
        document_id: Uuid,
        patch: DocumentPatch,
        actor: &Actor,
    ) -> DocumentResult<DocumentView> {
        let Some(old) = self.repository.get_active(&document_id) else {
            self.record_access(
                AccessLogEntry::new(document_id, AccessType::Update, actor)
                    .with_error("document not found"),
            );
            return Err(DocumentError::NotFound(document_id));
        };

        if patch.is_empty() {
            self.record_access(
                AccessLogEntry::new(document_id, AccessType::Update, actor)
                    .with_error("no fields supplied"),
            );
            return Err(DocumentError::NotFound(document_id));
        }

        let DocumentPatch {
            document_number,
            is_verified,
            verified_by,
            notes,
            metadata,
        } = patch;

        let mut updated = old.clone();
        if let Some(number) = document_number {
            updated.document_number = Some(number);
        }
        if let Some(notes) = notes {
            updated.notes = Some(notes);
        }
        if let Some(metadata) = metadata {
            updated.metadata = metadata;
        }

        let mut operation = AuditOperation::Update;
        match is_verified {
            Some(verified) => {
                if verified != old.is_verified {
                    operation = if verified {
                        AuditOperation::Verify
                    } else {
                        AuditOperation::Unverify
                    };
                }
                updated.is_verified = verified;
                if verified {
                    updated.verified_by = verified_by.or_else(|| Some(actor.user_id.clone()));
                    updated.verified_at = Some(Utc::now());
                } else {
                    updated.verified_by = None;
                    updated.verified_at = None;
                }
            }
            None => {
                if let Some(by) = verified_by {
                    updated.verified_by = Some(by);
                }
            }
        }

        let changed_fields = diff_fields(&old, &updated);
        updated.updated_at = Utc::now();

        self.repository.update(&updated)?;

        self.record_access(AccessLogEntry::new(document_id, AccessType::Update, actor));
        self.record_audit(
            AuditLogEntry::new(document_id, operation, actor)
                .with_old_values(old.snapshot())
                .with_new_values(updated.snapshot())
                .with_changed_fields(changed_fields),
        );

        self.view(updated)
    }

    /// Soft delete (default) flips `is_active` and keeps the file; hard
    /// delete removes the row and best-effort removes the file.
    pub fn delete(&self, document_id: Uuid, actor: &Actor, hard: bool) -> DocumentResult<()> {
        let Some(document) = self.repository.get(&document_id) else {
            self.record_access(
                AccessLogEntry::new(document_id, AccessType::Delete, actor)
                    .with_error("document not found"),
            );
            return Err(DocumentError::NotFound(document_id));
        };

        if hard {
            let removed = self.repository.remove(&document_id)?;
            if let Err(e) = self.backend.delete(&removed.file_path) {
                // The row is gone; a stranded file is an operator concern,
                // not a caller failure
                Logger::warn(
                    "document_file_remove_failed",
                    &[
                        ("document_id", &document_id.to_string()),
                        ("path", &removed.file_path),
                        ("error", &e.to_string()),
                    ],
                );
            }
            self.record_access(AccessLogEntry::new(document_id, AccessType::Delete, actor));
            self.record_audit(
                AuditLogEntry::new(document_id, AuditOperation::Delete, actor)
                    .with_old_values(removed.snapshot())
                    .with_reason("hard delete"),
            );
            return Ok(());
        }

        if !document.is_active {
            self.record_access(
                AccessLogEntry::new(document_id, AccessType::Delete, actor)
                    .with_error("document not found"),
            );
            return Err(DocumentError::NotFound(document_id));
        }

        let mut updated = document.clone();
        updated.is_active = false;
        updated.updated_at = Utc::now();
        self.repository.update(&updated)?;

        self.record_access(AccessLogEntry::new(document_id, AccessType::Delete, actor));
        self.record_audit(
            AuditLogEntry::new(document_id, AuditOperation::Delete, actor)
                .with_old_values(document.snapshot())
                .with_new_values(updated.snapshot())
                .with_changed_fields(vec!["is_active".to_string()]),
        );
        Ok(())
    }

    /// Bring a soft-deleted document back, re-checking the dedup invariant
    pub fn restore(&self, document_id: Uuid, actor: &Actor) -> DocumentResult<DocumentView> {
        let document = self
            .repository
            .get(&document_id)
            .ok_or(DocumentError::NotFound(document_id))?;

        if document.is_active {
            return self.view(document);
        }

        if let Some(hash) = &document.file_hash {
            if self
                .repository
                .find_active_by_hash(&document.entity_id, &document.document_type_id, hash)
                .is_some()
            {
                let type_name = self
                    .catalog
                    .get(&document.document_type_id)
                    .map(|t| t.type_name.clone())
                    .unwrap_or_default();
                return Err(DocumentError::DuplicateContent { type_name });
            }
        }

        let mut updated = document.clone();
        updated.is_active = true;
        updated.updated_at = Utc::now();
        self.repository.update(&updated)?;

        self.record_access(AccessLogEntry::new(document_id, AccessType::Update, actor));
        self.record_audit(
            AuditLogEntry::new(document_id, AuditOperation::Restore, actor)
                .with_old_values(document.snapshot())
                .with_new_values(updated.snapshot())
                .with_changed_fields(vec!["is_active".to_string()]),
        );

        self.view(updated)
    }

    /// Resolve a document's bytes for view or download.
    ///
    /// A missing file under a present row is logged as a failed access and
    /// reported as drift, not treated as fatal for the row.
    pub fn fetch_for_read(
        &self,
        document_id: Uuid,
        actor: &Actor,
        purpose: ReadPurpose,
    ) -> DocumentResult<DocumentContent> {
        let document = self
            .repository
            .get_active(&document_id)
            .ok_or(DocumentError::NotFound(document_id))?;

        let present = self.backend.exists(&document.file_path).unwrap_or(false);
        if !present {
            self.record_access(
                AccessLogEntry::new(document_id, purpose.access_type(), actor)
                    .with_error("file missing on disk"),
            );
            Logger::warn(
                "document_file_missing",
                &[
                    ("document_id", &document_id.to_string()),
                    ("path", &document.file_path),
                ],
            );
            return Err(DocumentError::NotFound(document_id));
        }

        let bytes = self.backend.read(&document.file_path)?;
        self.record_access(AccessLogEntry::new(document_id, purpose.access_type(), actor));

        Ok(DocumentContent {
            document: self.view(document)?,
            bytes,
        })
    }

    /// Audit trail for a document, newest first
    pub fn audit_trail(&self, document_id: Uuid, limit: Option<usize>) -> Vec<AuditLogEntry> {
        self.audit_log.trail_for_document(document_id, limit)
    }

    /// Everything a user changed, joined with document display fields
    pub fn user_audit_trail(&self, user_id: &str) -> Vec<UserAuditRecord> {
        self.audit_log
            .trail_for_user(user_id)
            .into_iter()
            .map(|entry| {
                let document = self.repository.get(&entry.document_id);
                let type_name = document.as_ref().and_then(|d| {
                    self.catalog
                        .get(&d.document_type_id)
                        .map(|t| t.type_name.clone())
                });
                UserAuditRecord {
                    original_file_name: document.map(|d| d.original_file_name),
                    type_name,
                    entry,
                }
            })
            .collect()
    }

    /// Aggregate audit stats within an optional time window
    pub fn audit_stats(
        &self,
        since: Option<chrono::DateTime<Utc>>,
        until: Option<chrono::DateTime<Utc>>,
    ) -> Vec<OperationStats> {
        self.audit_log.stats(since, until)
    }

    fn view(&self, document: Document) -> DocumentResult<DocumentView> {
        let entity = self
            .entities
            .get(&document.entity_id)
            .ok_or_else(|| DocumentError::Internal("entity record missing".into()))?;
        let dtype = self
            .catalog
            .get(&document.document_type_id)
            .ok_or_else(|| DocumentError::Internal("document type missing".into()))?;

        Ok(DocumentView {
            type_name: dtype.type_name.clone(),
            type_display_name: dtype.display_name.clone(),
            category: dtype.category.clone(),
            entity_type: entity.entity_type,
            external_entity_id: entity.external_entity_id,
            entity_name: entity.entity_name,
            document,
        })
    }

    fn record_access(&self, entry: AccessLogEntry) {
        if let Err(e) = self.access_log.append(&entry) {
            Logger::warn(
                "access_log_append_failed",
                &[
                    ("document_id", &entry.document_id.to_string()),
                    ("error", &e.to_string()),
                ],
            );
        }
    }

    fn record_audit(&self, entry: AuditLogEntry) {
        if let Err(e) = self.audit_log.append(&entry) {
            Logger::warn(
                "audit_log_append_failed",
                &[
                    ("document_id", &entry.document_id.to_string()),
                    ("error", &e.to_string()),
                ],
            );
        }
    }
}

fn diff_fields(old: &Document, new: &Document) -> Vec<String> {
    let mut changed = Vec::new();
    if old.document_number != new.document_number {
        changed.push("document_number".to_string());
    }
    if old.notes != new.notes {
        changed.push("notes".to_string());
    }
    if old.metadata != new.metadata {
        changed.push("metadata".to_string());
    }
    if old.is_verified != new.is_verified {
        changed.push("is_verified".to_string());
    }
    if old.verified_by != new.verified_by {
        changed.push("verified_by".to_string());
    }
    if old.verified_at != new.verified_at {
        changed.push("verified_at".to_string());
    }
    changed
}
