//! Local filesystem backend
//!
//! Temp slots live under `<root>/.tmp`; promote is a rename within the same
//! filesystem, so the final path either has the full contents or does not
//! exist.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use super::backend::StorageBackend;
use super::errors::{StorageError, StorageResult};

const TEMP_DIR: &str = ".tmp";

/// Local filesystem storage backend rooted at a directory
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at `root`
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a relative storage path to an absolute one, rejecting
    /// traversal components
    pub fn absolute_path(&self, path: &str) -> StorageResult<PathBuf> {
        let rel = Path::new(path);
        for component in rel.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(StorageError::InvalidPath(path.to_string())),
            }
        }
        Ok(self.root.join(rel))
    }

    fn temp_path(&self, token: &str) -> PathBuf {
        self.root.join(TEMP_DIR).join(token)
    }
}

impl StorageBackend for LocalBackend {
    fn write_temp(&self, data: &[u8]) -> StorageResult<String> {
        let temp_dir = self.root.join(TEMP_DIR);
        fs::create_dir_all(&temp_dir).map_err(|e| StorageError::Io(e.to_string()))?;

        let token = format!("{}.part", Uuid::new_v4());
        let temp_path = temp_dir.join(&token);

        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .map_err(|e| StorageError::Io(e.to_string()))?;
        file.write_all(data)
            .and_then(|_| file.sync_all())
            .map_err(|e| {
                let _ = fs::remove_file(&temp_path);
                StorageError::Io(e.to_string())
            })?;

        Ok(token)
    }

    fn promote(&self, temp: &str, path: &str) -> StorageResult<()> {
        let temp_path = self.temp_path(temp);
        let final_path = self.absolute_path(path)?;

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }

        fs::rename(&temp_path, &final_path).map_err(|e| StorageError::Io(e.to_string()))
    }

    fn discard(&self, temp: &str) -> StorageResult<()> {
        match fs::remove_file(self.temp_path(temp)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let full_path = self.absolute_path(path)?;
        fs::read(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::FileNotFound(path.to_string())
            } else {
                StorageError::Io(e.to_string())
            }
        })
    }

    fn delete(&self, path: &str) -> StorageResult<()> {
        let full_path = self.absolute_path(path)?;
        fs::remove_file(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::FileNotFound(path.to_string())
            } else {
                StorageError::Io(e.to_string())
            }
        })
    }

    fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.absolute_path(path)?.exists())
    }
}
