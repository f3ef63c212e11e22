//! CLI command implementations
//!
//! Boot order: config, directories, journals, log sinks, catalog; then the
//! command-specific surface (HTTP server or migration batch). Migration
//! runs offline, never inside the serving process.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::access_log::{AccessLog, FileAccessLog};
use crate::audit::AuditLog;
use crate::catalog::DocumentTypeCatalog;
use crate::config::DocVaultConfig;
use crate::document::{DocumentRepository, DocumentStore};
use crate::entity::EntityRegistry;
use crate::http_server::{AppState, HttpServer};
use crate::migration::{verify, LegacyStore, Migrator, StaticEntityDirectory};
use crate::observability::Logger;
use crate::search::SearchIndex;
use crate::storage::LocalBackend;

use super::args::{Cli, Command};
use super::errors::{CliError, CliErrorCode, CliResult};

/// Everything booted from configuration, shared by the commands
struct Subsystems {
    entities: Arc<EntityRegistry>,
    catalog: Arc<DocumentTypeCatalog>,
    repository: Arc<DocumentRepository>,
    access_log: Arc<dyn AccessLog>,
    audit_log: Arc<AuditLog>,
}

/// Dispatch a parsed command
pub fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Init { config } => init(&config),
        Command::Serve { config } => serve(&config),
        Command::Migrate {
            config,
            legacy_manifest,
            legacy_root,
            entity_names,
        } => migrate(&config, &legacy_manifest, &legacy_root, entity_names.as_deref()),
        Command::VerifyMigration {
            config,
            legacy_manifest,
            legacy_root,
        } => verify_migration(&config, &legacy_manifest, &legacy_root),
    }
}

fn load_config(path: &Path) -> CliResult<DocVaultConfig> {
    DocVaultConfig::load(path).map_err(|e| {
        CliError::new(
            CliErrorCode::ConfigError,
            format!("{}: {}", path.display(), e),
        )
    })
}

fn boot(config: &DocVaultConfig) -> CliResult<Subsystems> {
    fs::create_dir_all(&config.data_dir)
        .and_then(|_| fs::create_dir_all(&config.storage_dir))
        .map_err(|e| CliError::new(CliErrorCode::BootFailed, e.to_string()))?;

    let entities = Arc::new(
        EntityRegistry::open(&config.entities_journal_path())
            .map_err(|e| CliError::new(CliErrorCode::BootFailed, e.to_string()))?,
    );

    let catalog = Arc::new(match &config.document_types {
        Some(seeds) => DocumentTypeCatalog::from_seeds(seeds.clone()),
        None => DocumentTypeCatalog::with_defaults(),
    });

    let repository = Arc::new(
        DocumentRepository::open(&config.documents_journal_path())
            .map_err(|e| CliError::new(CliErrorCode::BootFailed, e.to_string()))?,
    );

    let access_log: Arc<dyn AccessLog> = Arc::new(
        FileAccessLog::open(config.access_log_path())
            .map_err(|e| CliError::new(CliErrorCode::BootFailed, e.to_string()))?,
    );

    let audit_log = Arc::new(
        AuditLog::open(&config.audit_log_path())
            .map_err(|e| CliError::new(CliErrorCode::BootFailed, e.to_string()))?,
    );

    Ok(Subsystems {
        entities,
        catalog,
        repository,
        access_log,
        audit_log,
    })
}

fn init(config_path: &Path) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::new(
            CliErrorCode::AlreadyInitialized,
            format!("{} already exists", config_path.display()),
        ));
    }

    let config = DocVaultConfig::default();
    config
        .save(config_path)
        .map_err(|e| CliError::new(CliErrorCode::IoError, e.to_string()))?;
    fs::create_dir_all(&config.data_dir)
        .and_then(|_| fs::create_dir_all(&config.storage_dir))
        .map_err(|e| CliError::new(CliErrorCode::IoError, e.to_string()))?;

    Logger::info(
        "init_complete",
        &[("config", &config_path.display().to_string())],
    );
    Ok(())
}

fn serve(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let subsystems = boot(&config)?;

    let store = Arc::new(DocumentStore::new(
        subsystems.entities.clone(),
        subsystems.catalog.clone(),
        subsystems.repository.clone(),
        LocalBackend::new(config.storage_dir.clone()),
        subsystems.access_log.clone(),
        subsystems.audit_log.clone(),
    ));
    let search = Arc::new(SearchIndex::new(
        subsystems.repository.clone(),
        subsystems.entities.clone(),
        subsystems.catalog.clone(),
    ));

    let state = Arc::new(AppState {
        store,
        search,
        catalog: subsystems.catalog.clone(),
    });

    let server = HttpServer::new(config.http.clone(), state);
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::new(CliErrorCode::BootFailed, e.to_string()))?;
    runtime
        .block_on(server.serve())
        .map_err(|e| CliError::new(CliErrorCode::IoError, e.to_string()))
}

fn migrate(
    config_path: &Path,
    legacy_manifest: &Path,
    legacy_root: &Path,
    entity_names: Option<&Path>,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let subsystems = boot(&config)?;

    let legacy = LegacyStore::open(legacy_manifest, legacy_root)
        .map_err(|e| CliError::new(CliErrorCode::MigrationFailed, e.to_string()))?;
    let directory = match entity_names {
        Some(path) => StaticEntityDirectory::from_file(path)
            .map_err(|e| CliError::new(CliErrorCode::MigrationFailed, e.to_string()))?,
        None => StaticEntityDirectory::empty(),
    };

    let backend = LocalBackend::new(config.storage_dir.clone());
    let mut migrator = Migrator::new(
        &legacy,
        &directory,
        subsystems.entities.clone(),
        subsystems.catalog.clone(),
        subsystems.repository.clone(),
        &backend,
        subsystems.access_log.clone(),
    );

    let report = migrator.run();
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::new(CliErrorCode::IoError, e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}

fn verify_migration(
    config_path: &Path,
    legacy_manifest: &Path,
    legacy_root: &Path,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let subsystems = boot(&config)?;

    let legacy = LegacyStore::open(legacy_manifest, legacy_root)
        .map_err(|e| CliError::new(CliErrorCode::MigrationFailed, e.to_string()))?;
    let backend = LocalBackend::new(config.storage_dir.clone());

    let report = verify(&legacy, &subsystems.repository, &backend);
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::new(CliErrorCode::IoError, e.to_string()))?;
    println!("{}", rendered);

    if !report.passed {
        return Err(CliError::new(
            CliErrorCode::VerificationFailed,
            format!(
                "migrated={} missing_files={}",
                report.migrated,
                report.missing_files.len()
            ),
        ));
    }
    Ok(())
}
