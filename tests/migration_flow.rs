//! Migration batch invariants: per-item isolation, idempotent re-runs,
//! and the verification pass.

use std::fs;
use std::sync::Arc;

use docvault::access_log::MemoryAccessLog;
use docvault::catalog::DocumentTypeCatalog;
use docvault::document::DocumentRepository;
use docvault::entity::EntityRegistry;
use docvault::migration::{
    verify, LegacyStore, MigrationState, Migrator, StaticEntityDirectory,
};
use docvault::storage::{LocalBackend, StorageBackend};
use tempfile::TempDir;

struct Fixture {
    entities: Arc<EntityRegistry>,
    catalog: Arc<DocumentTypeCatalog>,
    repository: Arc<DocumentRepository>,
    access_log: Arc<MemoryAccessLog>,
    target_dir: TempDir,
    legacy_dir: TempDir,
}

fn fixture() -> Fixture {
    Fixture {
        entities: Arc::new(EntityRegistry::in_memory()),
        catalog: Arc::new(DocumentTypeCatalog::with_defaults()),
        repository: Arc::new(DocumentRepository::in_memory()),
        access_log: Arc::new(MemoryAccessLog::new()),
        target_dir: TempDir::new().unwrap(),
        legacy_dir: TempDir::new().unwrap(),
    }
}

impl Fixture {
    fn backend(&self) -> LocalBackend {
        LocalBackend::new(self.target_dir.path().to_path_buf())
    }

    fn write_manifest(&self, manifest: &str) -> LegacyStore {
        let path = self.legacy_dir.path().join("legacy.json");
        fs::write(&path, manifest).unwrap();
        LegacyStore::open(&path, self.legacy_dir.path()).unwrap()
    }

    fn write_legacy_file(&self, rel: &str, bytes: &[u8]) {
        let path = self.legacy_dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn run(&self, legacy: &LegacyStore, backend: &LocalBackend) -> docvault::migration::MigrationReport {
        let directory = StaticEntityDirectory::empty();
        let mut migrator = Migrator::new(
            legacy,
            &directory,
            self.entities.clone(),
            self.catalog.clone(),
            self.repository.clone(),
            backend,
            self.access_log.clone(),
        );
        migrator.run()
    }
}

const TWO_DOCS: &str = r#"[
    {"id": 1, "entity_type": "client", "entity_id": 7,
     "document_type": "pan_card", "file_path": "old/pan.pdf",
     "file_size": 8, "mime_type": "application/pdf",
     "uploaded_at": "2022-01-01T00:00:00Z", "is_verified": true,
     "verified_by": "old-admin", "verified_at": "2022-02-01T00:00:00Z"},
    {"id": 2, "entity_type": "shop", "entity_id": 9,
     "document_type": "agreement", "file_path": "old/agreement.pdf",
     "file_size": 9, "mime_type": "application/pdf",
     "uploaded_at": "2022-03-01T00:00:00Z"}
]"#;

#[test]
fn empty_legacy_store_yields_zero_counts_and_failing_verification() {
    let f = fixture();
    let legacy = f.write_manifest("[]");
    let backend = f.backend();

    let report = f.run(&legacy, &backend);
    assert_eq!(report.success, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.state, MigrationState::Completed);

    // At least one migrated document is required for a pass
    let verification = verify(&legacy, &f.repository, &backend);
    assert!(!verification.passed);
    assert_eq!(verification.migrated, 0);
}

#[test]
fn full_run_then_rerun_is_idempotent() {
    let f = fixture();
    f.write_legacy_file("old/pan.pdf", b"pan-scan");
    f.write_legacy_file("old/agreement.pdf", b"agreement");
    let legacy = f.write_manifest(TWO_DOCS);
    let backend = f.backend();

    let report = f.run(&legacy, &backend);
    assert_eq!(report.success, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.state, MigrationState::Completed);

    // Verification state is carried forward
    let docs = f.repository.list_active();
    let pan = docs
        .iter()
        .find(|d| d.file_name == "pan.pdf")
        .expect("pan migrated");
    assert!(pan.is_verified);
    assert_eq!(pan.verified_by.as_deref(), Some("old-admin"));
    assert_eq!(pan.metadata.get("legacy_document_id").unwrap(), 1);

    // One upload access entry per migrated document, by the batch identity
    assert_eq!(f.access_log.len(), 2);
    assert!(f
        .access_log
        .records()
        .iter()
        .all(|e| e.accessed_by == "migration-script"));

    let verification = verify(&legacy, &f.repository, &backend);
    assert!(verification.passed);
    assert_eq!(verification.migrated, 2);
    assert_eq!(verification.legacy_active, 2);

    // Re-run: everything is skipped, nothing duplicated
    let rerun = f.run(&legacy, &backend);
    assert_eq!(rerun.success, 0);
    assert_eq!(rerun.skipped, 2);
    assert_eq!(rerun.failed, 0);
    assert_eq!(f.repository.count_active(), 2);
}

#[test]
fn item_failures_are_isolated() {
    let f = fixture();
    f.write_legacy_file("old/agreement.pdf", b"agreement");
    // pan.pdf intentionally missing on disk; voter_id is not in the catalog
    let manifest = r#"[
        {"id": 1, "entity_type": "client", "entity_id": 7,
         "document_type": "pan_card", "file_path": "old/pan.pdf",
         "file_size": 8, "mime_type": "application/pdf",
         "uploaded_at": "2022-01-01T00:00:00Z"},
        {"id": 2, "entity_type": "client", "entity_id": 7,
         "document_type": "voter_id", "file_path": "old/agreement.pdf",
         "file_size": 9, "mime_type": "application/pdf",
         "uploaded_at": "2022-02-01T00:00:00Z"},
        {"id": 3, "entity_type": "shop", "entity_id": 9,
         "document_type": "agreement", "file_path": "old/agreement.pdf",
         "file_size": 9, "mime_type": "application/pdf",
         "uploaded_at": "2022-03-01T00:00:00Z"}
    ]"#;
    let legacy = f.write_manifest(manifest);
    let backend = f.backend();

    let report = f.run(&legacy, &backend);
    assert_eq!(report.success, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.state, MigrationState::CompletedWithErrors);
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .any(|failure| failure.message.contains("voter_id")));
}

#[test]
fn migration_bypasses_dedup() {
    let f = fixture();
    // Two legacy rows with identical bytes for the same entity and type
    f.write_legacy_file("old/a.pdf", b"same-bytes");
    f.write_legacy_file("old/b.pdf", b"same-bytes");
    let manifest = r#"[
        {"id": 1, "entity_type": "client", "entity_id": 7,
         "document_type": "pan_card", "file_path": "old/a.pdf",
         "file_size": 10, "mime_type": "application/pdf",
         "uploaded_at": "2022-01-01T00:00:00Z"},
        {"id": 2, "entity_type": "client", "entity_id": 7,
         "document_type": "pan_card", "file_path": "old/b.pdf",
         "file_size": 10, "mime_type": "application/pdf",
         "uploaded_at": "2022-02-01T00:00:00Z"}
    ]"#;
    let legacy = f.write_manifest(manifest);
    let backend = f.backend();

    let report = f.run(&legacy, &backend);
    assert_eq!(report.success, 2);
    assert_eq!(report.failed, 0);
}

#[test]
fn verification_detects_missing_files() {
    let f = fixture();
    f.write_legacy_file("old/pan.pdf", b"pan-scan");
    f.write_legacy_file("old/agreement.pdf", b"agreement");
    let legacy = f.write_manifest(TWO_DOCS);
    let backend = f.backend();

    f.run(&legacy, &backend);

    // Remove one migrated file out from under the store
    let victim = f
        .repository
        .list_active()
        .into_iter()
        .next()
        .expect("migrated documents");
    backend.delete(&victim.file_path).unwrap();

    let verification = verify(&legacy, &f.repository, &backend);
    assert!(!verification.passed);
    assert_eq!(verification.missing_files, vec![victim.file_path]);
}

#[test]
fn entity_names_come_from_directory_or_are_synthesized() {
    let f = fixture();
    f.write_legacy_file("old/pan.pdf", b"pan-scan");
    f.write_legacy_file("old/agreement.pdf", b"agreement");
    let legacy = f.write_manifest(TWO_DOCS);
    let backend = f.backend();

    let names_path = f.legacy_dir.path().join("names.json");
    fs::write(
        &names_path,
        r#"[{"entity_type": "client", "external_entity_id": 7, "name": "Acme Traders"}]"#,
    )
    .unwrap();
    let directory = StaticEntityDirectory::from_file(&names_path).unwrap();

    let mut migrator = Migrator::new(
        &legacy,
        &directory,
        f.entities.clone(),
        f.catalog.clone(),
        f.repository.clone(),
        &backend,
        f.access_log.clone(),
    );
    migrator.run();

    let client = f.entities.lookup("client", 7).unwrap();
    assert_eq!(client.entity_name.as_deref(), Some("Acme Traders"));

    // Directory miss falls back to a synthesized label
    let shop = f.entities.lookup("shop", 9).unwrap();
    assert_eq!(shop.entity_name.as_deref(), Some("shop #9"));
}
