//! Storage backend trait

use super::errors::StorageResult;

/// Abstraction over the byte store holding document files.
///
/// Paths are relative, `/`-separated, and partitioned by the caller
/// (`entity_type/external_id/file_name`). Writes are two-phase: bytes land
/// in a temporary slot first and are promoted into their final path only
/// once the document row exists.
pub trait StorageBackend: Send + Sync {
    /// Write data to a temporary slot; returns a token for promote/discard
    fn write_temp(&self, data: &[u8]) -> StorageResult<String>;

    /// Atomically move a temporary slot into its final path, creating
    /// parent directories as needed
    fn promote(&self, temp: &str, path: &str) -> StorageResult<()>;

    /// Remove a temporary slot that will not be promoted
    fn discard(&self, temp: &str) -> StorageResult<()>;

    /// Read the full contents at a path
    fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Delete the file at a path
    fn delete(&self, path: &str) -> StorageResult<()>;

    /// Check whether a path exists
    fn exists(&self, path: &str) -> StorageResult<bool>;

    /// One-shot write: temp slot plus immediate promote
    fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let temp = self.write_temp(data)?;
        match self.promote(&temp, path) {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = self.discard(&temp);
                Err(e)
            }
        }
    }
}
