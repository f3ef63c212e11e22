//! Lifecycle invariants: soft/hard deletion, verification stamping, and
//! the logs emitted alongside every mutation.

use std::sync::Arc;

use docvault::access_log::{AccessType, MemoryAccessLog};
use docvault::actor::Actor;
use docvault::audit::{AuditLog, AuditOperation};
use docvault::catalog::DocumentTypeCatalog;
use docvault::document::{DocumentPatch, DocumentRepository, DocumentStore, UploadRequest};
use docvault::entity::EntityRegistry;
use docvault::storage::LocalBackend;
use tempfile::TempDir;

struct Fixture {
    store: DocumentStore<LocalBackend>,
    repository: Arc<DocumentRepository>,
    access_log: Arc<MemoryAccessLog>,
    audit_log: Arc<AuditLog>,
    dir: TempDir,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let repository = Arc::new(DocumentRepository::in_memory());
    let access_log = Arc::new(MemoryAccessLog::new());
    let audit_log = Arc::new(AuditLog::in_memory());
    let store = DocumentStore::new(
        Arc::new(EntityRegistry::in_memory()),
        Arc::new(DocumentTypeCatalog::with_defaults()),
        repository.clone(),
        LocalBackend::new(dir.path().to_path_buf()),
        access_log.clone(),
        audit_log.clone(),
    );
    Fixture {
        store,
        repository,
        access_log,
        audit_log,
        dir,
    }
}

fn upload(f: &Fixture, bytes: &[u8]) -> docvault::document::DocumentView {
    f.store
        .upload(
            UploadRequest {
                entity_type: "client".into(),
                external_entity_id: 1,
                entity_name: Some("Acme".into()),
                type_name: "pan_card".into(),
                document_number: None,
                original_file_name: "id.pdf".into(),
                bytes: bytes.to_vec(),
                mime_type: "application/pdf".into(),
                expiry_date: None,
                notes: None,
                metadata: None,
            },
            &Actor::new("uploader"),
        )
        .unwrap()
}

#[test]
fn soft_delete_hides_row_but_keeps_file() {
    let f = fixture();
    let view = upload(&f, b"%PDF soft");
    let file_path = f.dir.path().join(&view.document.file_path);

    f.store
        .delete(view.document.id, &Actor::new("ops"), false)
        .unwrap();

    assert!(f.store.get(view.document.id).is_err());
    // Row retained (inactive), file retained
    assert!(f.repository.get(&view.document.id).is_some());
    assert!(file_path.exists());
}

#[test]
fn hard_delete_removes_row_and_file() {
    let f = fixture();
    let view = upload(&f, b"%PDF hard");
    let file_path = f.dir.path().join(&view.document.file_path);
    assert!(file_path.exists());

    f.store
        .delete(view.document.id, &Actor::new("ops"), true)
        .unwrap();

    assert!(f.repository.get(&view.document.id).is_none());
    assert!(!file_path.exists());
}

#[test]
fn delete_emits_access_and_audit_entries() {
    let f = fixture();
    let view = upload(&f, b"%PDF logged");

    f.store
        .delete(view.document.id, &Actor::new("ops"), false)
        .unwrap();

    let last_access = f.access_log.records().pop().unwrap();
    assert_eq!(last_access.access_type, AccessType::Delete);
    assert!(last_access.success);

    let trail = f.audit_log.trail_for_document(view.document.id, None);
    assert_eq!(trail[0].operation, AuditOperation::Delete);
    assert!(trail[0].old_values.is_some());
}

#[test]
fn verify_then_unverify_stamps_and_tags() {
    let f = fixture();
    let view = upload(&f, b"%PDF verify");
    let checker = Actor::new("checker").with_role("compliance");

    let patch = DocumentPatch {
        is_verified: Some(true),
        ..Default::default()
    };
    let verified = f.store.update(view.document.id, patch, &checker).unwrap();
    assert!(verified.document.is_verified);
    assert_eq!(verified.document.verified_by.as_deref(), Some("checker"));
    assert!(verified.document.verified_at.is_some());

    let trail = f.audit_log.trail_for_document(view.document.id, None);
    assert_eq!(trail[0].operation, AuditOperation::Verify);
    assert!(trail[0].changed_fields.contains(&"is_verified".to_string()));
    assert!(trail[0].changed_fields.contains(&"verified_at".to_string()));

    let patch = DocumentPatch {
        is_verified: Some(false),
        ..Default::default()
    };
    let reverted = f.store.update(view.document.id, patch, &checker).unwrap();
    assert!(!reverted.document.is_verified);
    assert!(reverted.document.verified_by.is_none());

    let trail = f.audit_log.trail_for_document(view.document.id, None);
    assert_eq!(trail[0].operation, AuditOperation::Unverify);
}

#[test]
fn plain_field_update_tags_update_and_diffs() {
    let f = fixture();
    let view = upload(&f, b"%PDF update");

    let patch = DocumentPatch {
        notes: Some("reviewed by compliance".into()),
        document_number: Some("ABCDE1234F".into()),
        ..Default::default()
    };
    f.store
        .update(view.document.id, patch, &Actor::new("ops"))
        .unwrap();

    let trail = f.audit_log.trail_for_document(view.document.id, None);
    assert_eq!(trail[0].operation, AuditOperation::Update);
    assert!(trail[0].changed_fields.contains(&"notes".to_string()));
    assert!(trail[0]
        .changed_fields
        .contains(&"document_number".to_string()));
    assert!(!trail[0].changed_fields.contains(&"is_verified".to_string()));
}

#[test]
fn every_touch_is_access_logged() {
    let f = fixture();
    let actor = Actor::new("reader");
    let view = upload(&f, b"%PDF touched");

    f.store
        .fetch_for_read(view.document.id, &actor, docvault::document::ReadPurpose::View)
        .unwrap();
    f.store
        .fetch_for_read(
            view.document.id,
            &actor,
            docvault::document::ReadPurpose::Download,
        )
        .unwrap();

    let types: Vec<AccessType> = f
        .access_log
        .records()
        .iter()
        .map(|e| e.access_type)
        .collect();
    assert_eq!(
        types,
        vec![AccessType::Upload, AccessType::View, AccessType::Download]
    );
}
