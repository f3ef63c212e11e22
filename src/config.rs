//! Configuration
//!
//! One JSON config file drives the whole subsystem: where rows and logs
//! live, where document bytes live, the HTTP binding, and an optional
//! replacement for the built-in document type seed set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::DocumentTypeSeed;
use crate::http_server::HttpServerConfig;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocVaultConfig {
    /// Directory for row journals and log sinks
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Storage root for document bytes
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// HTTP server binding
    #[serde(default)]
    pub http: HttpServerConfig,

    /// Replaces the built-in document type seeds when present
    #[serde(default)]
    pub document_types: Option<Vec<DocumentTypeSeed>>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./data/files")
}

impl Default for DocVaultConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_dir: default_storage_dir(),
            http: HttpServerConfig::default(),
            document_types: None,
        }
    }
}

impl DocVaultConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write as pretty JSON
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)
    }

    /// Document row journal path
    pub fn documents_journal_path(&self) -> PathBuf {
        self.data_dir.join("documents.jsonl")
    }

    /// Entity journal path
    pub fn entities_journal_path(&self) -> PathBuf {
        self.data_dir.join("entities.jsonl")
    }

    /// Access log sink path
    pub fn access_log_path(&self) -> PathBuf {
        self.data_dir.join("access.jsonl")
    }

    /// Audit log sink path
    pub fn audit_log_path(&self) -> PathBuf {
        self.data_dir.join("audit.jsonl")
    }
}
