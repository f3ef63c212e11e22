//! Append-only access log sinks
//!
//! The file sink writes one JSON record per line and flushes on every
//! append. Sink failures are the caller's to report; they must never roll
//! back the operation that produced the entry.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::entry::AccessLogEntry;

/// Append-only access log sink
pub trait AccessLog: Send + Sync {
    /// Append a record; the record is visible/durable when this returns
    fn append(&self, entry: &AccessLogEntry) -> io::Result<()>;
}

/// File-backed access log: one JSON record per line
pub struct FileAccessLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileAccessLog {
    /// Open or create the log file
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// The log file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AccessLog for FileAccessLog {
    fn append(&self, entry: &AccessLogEntry) -> io::Result<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
        writeln!(writer, "{}", json)?;
        writer.flush()
    }
}

/// In-memory access log for tests
#[derive(Debug, Default)]
pub struct MemoryAccessLog {
    entries: Mutex<Vec<AccessLogEntry>>,
}

impl MemoryAccessLog {
    /// Create an empty in-memory log
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, in append order
    pub fn records(&self) -> Vec<AccessLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of recorded entries
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl AccessLog for MemoryAccessLog {
    fn append(&self, entry: &AccessLogEntry) -> io::Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_log::entry::AccessType;
    use crate::actor::Actor;
    use tempfile::tempdir;
    use uuid::Uuid;

    #[test]
    fn test_memory_log_appends() {
        let log = MemoryAccessLog::new();
        let actor = Actor::new("u1");

        log.append(&AccessLogEntry::new(Uuid::new_v4(), AccessType::Upload, &actor))
            .unwrap();
        log.append(&AccessLogEntry::new(Uuid::new_v4(), AccessType::View, &actor))
            .unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0].access_type, AccessType::Upload);
    }

    #[test]
    fn test_file_log_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("access.jsonl");

        let log = FileAccessLog::open(&path).unwrap();
        let actor = Actor::new("auditor").with_user_agent("curl/8");
        log.append(&AccessLogEntry::new(Uuid::new_v4(), AccessType::Download, &actor))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: AccessLogEntry = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.access_type, AccessType::Download);
        assert_eq!(parsed.accessed_by, "auditor");
    }
}
