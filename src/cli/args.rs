//! CLI argument definitions using clap
//!
//! Commands:
//! - docvault init --config <path>
//! - docvault serve --config <path>
//! - docvault migrate --config <path> --legacy-manifest <path> --legacy-root <path>
//! - docvault verify-migration --config <path> --legacy-manifest <path> --legacy-root <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docvault - document management and audit subsystem
#[derive(Parser, Debug)]
#[command(name = "docvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file and create the data directories
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./docvault.json")]
        config: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./docvault.json")]
        config: PathBuf,
    },

    /// Migrate documents from a legacy store (offline batch)
    Migrate {
        /// Path to configuration file
        #[arg(long, default_value = "./docvault.json")]
        config: PathBuf,

        /// Path to the legacy manifest (JSON array of rows)
        #[arg(long)]
        legacy_manifest: PathBuf,

        /// Root of the legacy file tree
        #[arg(long)]
        legacy_root: PathBuf,

        /// Optional entity directory file for display names
        #[arg(long)]
        entity_names: Option<PathBuf>,
    },

    /// Verify a completed migration
    VerifyMigration {
        /// Path to configuration file
        #[arg(long, default_value = "./docvault.json")]
        config: PathBuf,

        /// Path to the legacy manifest (JSON array of rows)
        #[arg(long)]
        legacy_manifest: PathBuf,

        /// Root of the legacy file tree
        #[arg(long)]
        legacy_root: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
