//! Idempotent upsert/lookup of external entities
//!
//! The registry is keyed by (entity_type, external_entity_id). Upserts are
//! durable through an append-only JSON-lines journal that is replayed on
//! open; the last record per key wins.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{EntityError, EntityResult};

/// A locally tracked external entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub entity_type: String,
    pub external_entity_id: i64,
    /// Cached display label; refreshed on every upsert that carries one
    pub entity_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

type EntityKey = (String, i64);

/// Entity registry with idempotent upsert semantics
pub struct EntityRegistry {
    entities: RwLock<HashMap<EntityKey, Entity>>,
    journal: Option<Mutex<BufWriter<File>>>,
}

impl EntityRegistry {
    /// Create a registry with no durable journal (tests)
    pub fn in_memory() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            journal: None,
        }
    }

    /// Open a journal-backed registry, replaying any existing records
    pub fn open(path: &Path) -> EntityResult<Self> {
        let mut entities = HashMap::new();

        if path.exists() {
            let file = File::open(path)
                .map_err(|e| EntityError::Internal(format!("open {}: {}", path.display(), e)))?;
            for line in BufReader::new(file).lines() {
                let line =
                    line.map_err(|e| EntityError::Internal(format!("read journal: {}", e)))?;
                if line.trim().is_empty() {
                    continue;
                }
                let entity: Entity = serde_json::from_str(&line)
                    .map_err(|e| EntityError::Internal(format!("corrupt journal record: {}", e)))?;
                entities.insert((entity.entity_type.clone(), entity.external_entity_id), entity);
            }
        } else if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EntityError::Internal(format!("create {}: {}", parent.display(), e)))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| EntityError::Internal(format!("open {}: {}", path.display(), e)))?;

        Ok(Self {
            entities: RwLock::new(entities),
            journal: Some(Mutex::new(BufWriter::new(file))),
        })
    }

    /// Create the entity or refresh its name and timestamp; never errors on
    /// repeats
    pub fn upsert(
        &self,
        entity_type: &str,
        external_entity_id: i64,
        entity_name: Option<&str>,
    ) -> EntityResult<Entity> {
        let mut entities = self
            .entities
            .write()
            .map_err(|_| EntityError::Internal("lock poisoned".into()))?;

        let key = (entity_type.to_string(), external_entity_id);
        let entity = match entities.entry(key) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get_mut();
                if let Some(name) = entity_name {
                    existing.entity_name = Some(name.to_string());
                }
                existing.updated_at = Utc::now();
                existing.clone()
            }
            Entry::Vacant(vacant) => {
                let entity = Entity {
                    id: Uuid::new_v4(),
                    entity_type: entity_type.to_string(),
                    external_entity_id,
                    entity_name: entity_name.map(str::to_string),
                    updated_at: Utc::now(),
                };
                vacant.insert(entity.clone());
                entity
            }
        };

        self.append(&entity)?;
        Ok(entity)
    }

    /// Look up by (type, external id)
    pub fn lookup(&self, entity_type: &str, external_entity_id: i64) -> EntityResult<Entity> {
        let entities = self
            .entities
            .read()
            .map_err(|_| EntityError::Internal("lock poisoned".into()))?;

        entities
            .get(&(entity_type.to_string(), external_entity_id))
            .cloned()
            .ok_or_else(|| EntityError::NotFound {
                entity_type: entity_type.to_string(),
                external_entity_id,
            })
    }

    /// Look up by internal id (for joins)
    pub fn get(&self, id: &Uuid) -> Option<Entity> {
        self.entities
            .read()
            .ok()
            .and_then(|entities| entities.values().find(|e| e.id == *id).cloned())
    }

    fn append(&self, entity: &Entity) -> EntityResult<()> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        let json = serde_json::to_string(entity)
            .map_err(|e| EntityError::Internal(format!("serialize entity: {}", e)))?;
        let mut writer = journal
            .lock()
            .map_err(|_| EntityError::Internal("lock poisoned".into()))?;
        writeln!(writer, "{}", json)
            .and_then(|_| writer.flush())
            .map_err(|e| EntityError::Internal(format!("journal append: {}", e)))
    }
}
