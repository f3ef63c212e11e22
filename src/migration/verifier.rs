//! Post-migration verification
//!
//! Compares the legacy active-document count against the migrated count
//! and confirms every migrated file path resolves to an existing file.
//! Verification passes only with zero missing files and at least one
//! migrated document.

use serde::Serialize;

use crate::document::DocumentRepository;
use crate::storage::StorageBackend;

use super::legacy::LegacyStore;
use super::migrator::LEGACY_ID_KEY;

/// Outcome of the verification pass
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub legacy_active: usize,
    pub migrated: usize,
    pub missing_files: Vec<String>,
    pub passed: bool,
}

/// Run the verification pass against the target store
pub fn verify<B: StorageBackend>(
    legacy: &LegacyStore,
    repository: &DocumentRepository,
    backend: &B,
) -> VerificationReport {
    let migrated: Vec<_> = repository
        .list_active()
        .into_iter()
        .filter(|d| d.metadata.get(LEGACY_ID_KEY).is_some())
        .collect();

    let mut missing_files = Vec::new();
    for document in &migrated {
        let present = backend.exists(&document.file_path).unwrap_or(false);
        if !present {
            missing_files.push(document.file_path.clone());
        }
    }

    let passed = missing_files.is_empty() && !migrated.is_empty();

    VerificationReport {
        legacy_active: legacy.active_count(),
        migrated: migrated.len(),
        missing_files,
        passed,
    }
}
