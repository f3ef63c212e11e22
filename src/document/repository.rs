//! Document row persistence
//!
//! Rows live in an in-memory map and are made durable through an
//! append-only JSON-lines journal of row events, replayed on open (last
//! event per id wins). Each mutation is one locked map change plus one
//! journal append, which is the atomicity unit of the subsystem.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{DocumentError, DocumentResult};
use super::record::Document;

/// A journaled row mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum RowEvent {
    Insert { row: Document },
    Update { row: Document },
    Remove { id: Uuid },
}

/// Repository of document rows
pub struct DocumentRepository {
    rows: RwLock<HashMap<Uuid, Document>>,
    journal: Option<Mutex<BufWriter<File>>>,
}

impl DocumentRepository {
    /// Create a repository with no durable journal (tests)
    pub fn in_memory() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            journal: None,
        }
    }

    /// Open a journal-backed repository, replaying events to current state
    pub fn open(path: &Path) -> DocumentResult<Self> {
        let mut rows = HashMap::new();

        if path.exists() {
            let file = File::open(path)
                .map_err(|e| DocumentError::Internal(format!("open {}: {}", path.display(), e)))?;
            for line in BufReader::new(file).lines() {
                let line =
                    line.map_err(|e| DocumentError::Internal(format!("read journal: {}", e)))?;
                if line.trim().is_empty() {
                    continue;
                }
                let event: RowEvent = serde_json::from_str(&line).map_err(|e| {
                    DocumentError::Internal(format!("corrupt journal record: {}", e))
                })?;
                match event {
                    RowEvent::Insert { row } | RowEvent::Update { row } => {
                        rows.insert(row.id, row);
                    }
                    RowEvent::Remove { id } => {
                        rows.remove(&id);
                    }
                }
            }
        } else if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DocumentError::Internal(format!("create {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| DocumentError::Internal(format!("open {}: {}", path.display(), e)))?;

        Ok(Self {
            rows: RwLock::new(rows),
            journal: Some(Mutex::new(BufWriter::new(file))),
        })
    }

    /// Insert a new row
    pub fn insert(&self, document: &Document) -> DocumentResult<()> {
        let mut rows = self.write_lock()?;
        if rows.contains_key(&document.id) {
            return Err(DocumentError::Internal(format!(
                "duplicate row id {}",
                document.id
            )));
        }
        self.append(&RowEvent::Insert {
            row: document.clone(),
        })?;
        rows.insert(document.id, document.clone());
        Ok(())
    }

    /// Replace an existing row
    pub fn update(&self, document: &Document) -> DocumentResult<()> {
        let mut rows = self.write_lock()?;
        if !rows.contains_key(&document.id) {
            return Err(DocumentError::NotFound(document.id));
        }
        self.append(&RowEvent::Update {
            row: document.clone(),
        })?;
        rows.insert(document.id, document.clone());
        Ok(())
    }

    /// Remove a row, returning it
    pub fn remove(&self, id: &Uuid) -> DocumentResult<Document> {
        let mut rows = self.write_lock()?;
        match rows.get(id).cloned() {
            Some(document) => {
                self.append(&RowEvent::Remove { id: *id })?;
                rows.remove(id);
                Ok(document)
            }
            None => Err(DocumentError::NotFound(*id)),
        }
    }

    /// Fetch a row regardless of its soft-delete state
    pub fn get(&self, id: &Uuid) -> Option<Document> {
        self.rows.read().ok()?.get(id).cloned()
    }

    /// Fetch an active row
    pub fn get_active(&self, id: &Uuid) -> Option<Document> {
        self.get(id).filter(|d| d.is_active)
    }

    /// Find an active row for (entity, type) with the given content hash
    pub fn find_active_by_hash(
        &self,
        entity_id: &Uuid,
        document_type_id: &Uuid,
        file_hash: &str,
    ) -> Option<Document> {
        let rows = self.rows.read().ok()?;
        rows.values()
            .find(|d| {
                d.is_active
                    && d.entity_id == *entity_id
                    && d.document_type_id == *document_type_id
                    && d.file_hash.as_deref() == Some(file_hash)
            })
            .cloned()
    }

    /// Find any row for (entity, type) with the given storage file name
    pub fn find_by_file_name(
        &self,
        entity_id: &Uuid,
        document_type_id: &Uuid,
        file_name: &str,
    ) -> Option<Document> {
        let rows = self.rows.read().ok()?;
        rows.values()
            .find(|d| {
                d.entity_id == *entity_id
                    && d.document_type_id == *document_type_id
                    && d.file_name == file_name
            })
            .cloned()
    }

    /// All active rows, unordered
    pub fn list_active(&self) -> Vec<Document> {
        self.rows
            .read()
            .map(|rows| rows.values().filter(|d| d.is_active).cloned().collect())
            .unwrap_or_default()
    }

    /// Active rows for an entity, optionally narrowed to one type, newest
    /// first
    pub fn list_for_entity(&self, entity_id: &Uuid, document_type_id: Option<Uuid>) -> Vec<Document> {
        let mut documents: Vec<Document> = self
            .rows
            .read()
            .map(|rows| {
                rows.values()
                    .filter(|d| d.is_active && d.entity_id == *entity_id)
                    .filter(|d| document_type_id.map_or(true, |t| d.document_type_id == t))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        documents
    }

    /// Number of active rows
    pub fn count_active(&self) -> usize {
        self.rows
            .read()
            .map(|rows| rows.values().filter(|d| d.is_active).count())
            .unwrap_or(0)
    }

    fn write_lock(&self) -> DocumentResult<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Document>>> {
        self.rows
            .write()
            .map_err(|_| DocumentError::Internal("lock poisoned".into()))
    }

    fn append(&self, event: &RowEvent) -> DocumentResult<()> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        let json = serde_json::to_string(event)
            .map_err(|e| DocumentError::Internal(format!("serialize row event: {}", e)))?;
        let mut writer = journal
            .lock()
            .map_err(|_| DocumentError::Internal("lock poisoned".into()))?;
        writeln!(writer, "{}", json)
            .and_then(|_| writer.flush())
            .map_err(|e| DocumentError::Internal(format!("journal append: {}", e)))
    }
}
