//! Queryable append-only audit log
//!
//! Entries are held in an in-memory index for queries and optionally made
//! durable through a JSON-lines file that is replayed on open. There is no
//! update or delete surface.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::entry::{AuditLogEntry, AuditOperation};

/// Aggregate counts for one operation within a time window
#[derive(Debug, Clone, Serialize)]
pub struct OperationStats {
    pub operation: AuditOperation,
    pub count: usize,
    pub distinct_documents: usize,
    pub distinct_users: usize,
}

/// Append-only audit log with a queryable in-memory index
pub struct AuditLog {
    entries: RwLock<Vec<AuditLogEntry>>,
    writer: Option<Mutex<BufWriter<File>>>,
}

impl AuditLog {
    /// Create a log with no durable file (tests)
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            writer: None,
        }
    }

    /// Open a file-backed log, replaying existing records into the index
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut entries = Vec::new();

        if path.exists() {
            let file = File::open(path)?;
            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: AuditLogEntry = serde_json::from_str(&line)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                entries.push(entry);
            }
        } else if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            entries: RwLock::new(entries),
            writer: Some(Mutex::new(BufWriter::new(file))),
        })
    }

    /// Append a record; visible to queries when this returns
    pub fn append(&self, entry: &AuditLogEntry) -> io::Result<()> {
        if let Some(writer) = &self.writer {
            let json = serde_json::to_string(entry)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let mut writer = writer
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        self.entries
            .write()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?
            .push(entry.clone());
        Ok(())
    }

    /// Trail for one document, newest first, optionally limited
    pub fn trail_for_document(
        &self,
        document_id: Uuid,
        limit: Option<usize>,
    ) -> Vec<AuditLogEntry> {
        let entries = match self.entries.read() {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut trail: Vec<AuditLogEntry> = entries
            .iter()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect();
        trail.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            trail.truncate(limit);
        }
        trail
    }

    /// Trail of everything one user changed, newest first
    pub fn trail_for_user(&self, user_id: &str) -> Vec<AuditLogEntry> {
        let entries = match self.entries.read() {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut trail: Vec<AuditLogEntry> = entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        trail.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        trail
    }

    /// Aggregate stats grouped by operation within an optional time window
    pub fn stats(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Vec<OperationStats> {
        let entries = match self.entries.read() {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut grouped: Vec<(AuditOperation, usize, HashSet<Uuid>, HashSet<String>)> = Vec::new();
        for entry in entries.iter() {
            if since.map_or(false, |s| entry.timestamp < s) {
                continue;
            }
            if until.map_or(false, |u| entry.timestamp > u) {
                continue;
            }

            if let Some(position) = grouped.iter().position(|(op, ..)| *op == entry.operation) {
                let (_, count, documents, users) = &mut grouped[position];
                *count += 1;
                documents.insert(entry.document_id);
                users.insert(entry.user_id.clone());
            } else {
                grouped.push((
                    entry.operation,
                    1,
                    HashSet::from([entry.document_id]),
                    HashSet::from([entry.user_id.clone()]),
                ));
            }
        }

        let mut stats: Vec<OperationStats> = grouped
            .into_iter()
            .map(|(operation, count, documents, users)| OperationStats {
                operation,
                count,
                distinct_documents: documents.len(),
                distinct_users: users.len(),
            })
            .collect();
        stats.sort_by_key(|s| s.operation.as_str());
        stats
    }

    /// Number of entries in the index
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use tempfile::tempdir;

    fn entry(document_id: Uuid, operation: AuditOperation, user: &str) -> AuditLogEntry {
        AuditLogEntry::new(document_id, operation, &Actor::new(user))
    }

    #[test]
    fn test_trail_for_document_newest_first() {
        let log = AuditLog::in_memory();
        let doc = Uuid::new_v4();

        log.append(&entry(doc, AuditOperation::Create, "u1")).unwrap();
        log.append(&entry(doc, AuditOperation::Update, "u2")).unwrap();
        log.append(&entry(Uuid::new_v4(), AuditOperation::Create, "u1"))
            .unwrap();

        let trail = log.trail_for_document(doc, None);
        assert_eq!(trail.len(), 2);
        assert!(trail[0].timestamp >= trail[1].timestamp);
        assert_eq!(trail[0].operation, AuditOperation::Update);
    }

    #[test]
    fn test_trail_limit() {
        let log = AuditLog::in_memory();
        let doc = Uuid::new_v4();
        for _ in 0..5 {
            log.append(&entry(doc, AuditOperation::Update, "u1")).unwrap();
        }

        assert_eq!(log.trail_for_document(doc, Some(2)).len(), 2);
    }

    #[test]
    fn test_trail_for_user() {
        let log = AuditLog::in_memory();
        log.append(&entry(Uuid::new_v4(), AuditOperation::Create, "alice"))
            .unwrap();
        log.append(&entry(Uuid::new_v4(), AuditOperation::Delete, "bob"))
            .unwrap();

        let trail = log.trail_for_user("alice");
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].operation, AuditOperation::Create);
    }

    #[test]
    fn test_stats_groups_and_distinct_counts() {
        let log = AuditLog::in_memory();
        let doc = Uuid::new_v4();

        log.append(&entry(doc, AuditOperation::Update, "u1")).unwrap();
        log.append(&entry(doc, AuditOperation::Update, "u2")).unwrap();
        log.append(&entry(Uuid::new_v4(), AuditOperation::Create, "u1"))
            .unwrap();

        let stats = log.stats(None, None);
        let update = stats
            .iter()
            .find(|s| s.operation == AuditOperation::Update)
            .unwrap();
        assert_eq!(update.count, 2);
        assert_eq!(update.distinct_documents, 1);
        assert_eq!(update.distinct_users, 2);
    }

    #[test]
    fn test_stats_time_window() {
        let log = AuditLog::in_memory();
        log.append(&entry(Uuid::new_v4(), AuditOperation::Create, "u1"))
            .unwrap();

        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(log.stats(Some(future), None).is_empty());
        assert_eq!(log.stats(None, Some(future)).len(), 1);
    }

    #[test]
    fn test_file_log_replay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let doc = Uuid::new_v4();

        {
            let log = AuditLog::open(&path).unwrap();
            log.append(&entry(doc, AuditOperation::Create, "u1")).unwrap();
        }

        let reopened = AuditLog::open(&path).unwrap();
        assert_eq!(reopened.trail_for_document(doc, None).len(), 1);
    }
}
