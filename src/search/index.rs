//! Search execution and aggregates

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::catalog::DocumentTypeCatalog;
use crate::document::{Document, DocumentRepository, DocumentView};
use crate::entity::EntityRegistry;

use super::errors::{SearchError, SearchResult};
use super::filter::{build_predicates, DocumentFilter};

/// Cap on rows returned by the expiring sugar
const EXPIRING_LIMIT: usize = 100;

/// Per-type aggregate over active documents
#[derive(Debug, Clone, Serialize)]
pub struct TypeStats {
    pub type_name: String,
    pub display_name: String,
    pub category: String,
    pub document_count: usize,
    pub total_bytes: u64,
    pub verified_count: usize,
}

/// Filtered, paginated queries over active documents
pub struct SearchIndex {
    repository: Arc<DocumentRepository>,
    entities: Arc<EntityRegistry>,
    catalog: Arc<DocumentTypeCatalog>,
}

impl SearchIndex {
    /// Create an index over the same records the store writes
    pub fn new(
        repository: Arc<DocumentRepository>,
        entities: Arc<EntityRegistry>,
        catalog: Arc<DocumentTypeCatalog>,
    ) -> Self {
        Self {
            repository,
            entities,
            catalog,
        }
    }

    /// Conjunctive filtered search, newest first.
    ///
    /// Offset is applied only when a limit is present.
    pub fn search(&self, filter: &DocumentFilter) -> SearchResult<Vec<DocumentView>> {
        if let Some(type_name) = &filter.type_name {
            if self.catalog.get_by_name(type_name).is_err() {
                return Err(SearchError::UnknownTypeName(type_name.clone()));
            }
        }

        let predicates = build_predicates(filter);

        let mut views: Vec<DocumentView> = self
            .repository
            .list_active()
            .into_iter()
            .filter_map(|document| self.join(document))
            .filter(|view| predicates.iter().all(|p| p.matches(view)))
            .collect();

        views.sort_by(|a, b| b.document.uploaded_at.cmp(&a.document.uploaded_at));

        if let Some(limit) = filter.limit {
            let offset = filter.offset.unwrap_or(0);
            views = views.into_iter().skip(offset).take(limit).collect();
        }

        Ok(views)
    }

    /// Documents expiring within the next `within_days` days, capped at
    /// 100 rows
    pub fn expiring(&self, within_days: i64) -> SearchResult<Vec<DocumentView>> {
        let bound = Utc::now() + Duration::days(within_days);
        let filter = DocumentFilter::default()
            .with_expiring_before(bound)
            .with_limit(EXPIRING_LIMIT);
        self.search(&filter)
    }

    /// Per-type aggregates; zero-document types still appear
    pub fn stats(&self, entity_type: Option<&str>) -> Vec<TypeStats> {
        let documents = self.repository.list_active();

        self.catalog
            .list(None)
            .into_iter()
            .map(|dtype| {
                let mut document_count = 0;
                let mut total_bytes = 0;
                let mut verified_count = 0;

                for document in &documents {
                    if document.document_type_id != dtype.id {
                        continue;
                    }
                    if let Some(wanted) = entity_type {
                        let matches = self
                            .entities
                            .get(&document.entity_id)
                            .map_or(false, |e| e.entity_type == wanted);
                        if !matches {
                            continue;
                        }
                    }
                    document_count += 1;
                    total_bytes += document.file_size;
                    if document.is_verified {
                        verified_count += 1;
                    }
                }

                TypeStats {
                    type_name: dtype.type_name.clone(),
                    display_name: dtype.display_name.clone(),
                    category: dtype.category.clone(),
                    document_count,
                    total_bytes,
                    verified_count,
                }
            })
            .collect()
    }

    fn join(&self, document: Document) -> Option<DocumentView> {
        let entity = self.entities.get(&document.entity_id)?;
        let dtype = self.catalog.get(&document.document_type_id)?;
        Some(DocumentView {
            type_name: dtype.type_name.clone(),
            type_display_name: dtype.display_name.clone(),
            category: dtype.category.clone(),
            entity_type: entity.entity_type,
            external_entity_id: entity.external_entity_id,
            entity_name: entity.entity_name,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_log::MemoryAccessLog;
    use crate::actor::Actor;
    use crate::audit::AuditLog;
    use crate::document::{DocumentStore, UploadRequest};
    use crate::storage::LocalBackend;
    use tempfile::TempDir;

    struct Fixture {
        store: DocumentStore<LocalBackend>,
        index: SearchIndex,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let entities = Arc::new(EntityRegistry::in_memory());
        let catalog = Arc::new(DocumentTypeCatalog::with_defaults());
        let repository = Arc::new(DocumentRepository::in_memory());
        let store = DocumentStore::new(
            entities.clone(),
            catalog.clone(),
            repository.clone(),
            LocalBackend::new(dir.path().to_path_buf()),
            Arc::new(MemoryAccessLog::new()),
            Arc::new(AuditLog::in_memory()),
        );
        let index = SearchIndex::new(repository, entities, catalog);
        Fixture {
            store,
            index,
            _dir: dir,
        }
    }

    fn upload(
        f: &Fixture,
        entity_type: &str,
        external_entity_id: i64,
        type_name: &str,
        bytes: &[u8],
        expiry_days: Option<i64>,
    ) {
        f.store
            .upload(
                UploadRequest {
                    entity_type: entity_type.into(),
                    external_entity_id,
                    entity_name: None,
                    type_name: type_name.into(),
                    document_number: None,
                    original_file_name: "f.pdf".into(),
                    bytes: bytes.to_vec(),
                    mime_type: "application/pdf".into(),
                    expiry_date: expiry_days.map(|d| Utc::now() + Duration::days(d)),
                    notes: None,
                    metadata: None,
                },
                &Actor::new("u1"),
            )
            .unwrap();
    }

    #[test]
    fn test_no_filters_returns_all_active() {
        let f = fixture();
        upload(&f, "client", 1, "pan_card", b"a", None);
        upload(&f, "shop", 2, "agreement", b"b", None);

        let all = f.index.search(&DocumentFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_each_filter_narrows() {
        let f = fixture();
        upload(&f, "client", 1, "pan_card", b"a", None);
        upload(&f, "client", 2, "pan_card", b"b", None);
        upload(&f, "shop", 2, "agreement", b"c", None);

        let all = f.index.search(&DocumentFilter::default()).unwrap();
        let clients = f
            .index
            .search(&DocumentFilter::default().with_entity_type("client"))
            .unwrap();
        let client_two = f
            .index
            .search(
                &DocumentFilter::default()
                    .with_entity_type("client")
                    .with_external_entity_id(2),
            )
            .unwrap();

        assert!(clients.len() < all.len());
        assert!(client_two.len() < clients.len());
        assert_eq!(client_two.len(), 1);
    }

    #[test]
    fn test_offset_ignored_without_limit() {
        let f = fixture();
        upload(&f, "client", 1, "pan_card", b"a", None);
        upload(&f, "client", 1, "agreement", b"b", None);

        let filter = DocumentFilter::default().with_offset(1);
        assert_eq!(f.index.search(&filter).unwrap().len(), 2);

        let filter = DocumentFilter::default().with_limit(1).with_offset(1);
        assert_eq!(f.index.search(&filter).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_type_name_is_invalid_filter() {
        let f = fixture();
        let filter = DocumentFilter::default().with_type_name("voter_id");
        assert!(matches!(
            f.index.search(&filter),
            Err(SearchError::UnknownTypeName(_))
        ));
    }

    #[test]
    fn test_expiring_only_matches_dated_documents() {
        let f = fixture();
        upload(&f, "client", 1, "pan_card", b"a", Some(10));
        upload(&f, "client", 1, "agreement", b"b", None);
        upload(&f, "client", 1, "address_proof", b"c", Some(400));

        let soon = f.index.expiring(30).unwrap();
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].type_name, "pan_card");
    }

    #[test]
    fn test_stats_includes_zero_count_types() {
        let f = fixture();
        upload(&f, "client", 1, "pan_card", b"abcd", None);

        let stats = f.index.stats(None);
        let pan = stats.iter().find(|s| s.type_name == "pan_card").unwrap();
        assert_eq!(pan.document_count, 1);
        assert_eq!(pan.total_bytes, 4);
        assert_eq!(pan.verified_count, 0);

        let agreement = stats.iter().find(|s| s.type_name == "agreement").unwrap();
        assert_eq!(agreement.document_count, 0);
    }

    #[test]
    fn test_stats_filtered_by_entity_type() {
        let f = fixture();
        upload(&f, "client", 1, "pan_card", b"a", None);
        upload(&f, "shop", 2, "pan_card", b"b", None);

        let stats = f.index.stats(Some("shop"));
        let pan = stats.iter().find(|s| s.type_name == "pan_card").unwrap();
        assert_eq!(pan.document_count, 1);
    }
}
