//! Save snapshots and the stores that hold them.
//!
//! A snapshot is one JSON document written under a single key. Documents
//! carry a schema `version`; documents written before versioning existed
//! have no such field and are migrated on load.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sso_core::{Achievements, Grid, Ship};
use thiserror::Error;

use crate::journal::LogEntry;
use crate::travel::TravelInfo;

/// Schema version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Errors reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid snapshot JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document was written by a newer build.
    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the document.
        found: u64,
        /// Newest version this build reads.
        supported: u32,
    },

    /// The key cannot be used as a storage name.
    #[error("invalid store key '{0}'")]
    InvalidKey(String),
}

/// Everything needed to resume a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version.
    pub version: u32,
    /// Wall-clock time of the save.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    /// The ship.
    pub ship: Ship,
    /// The world.
    pub grid: Grid,
    /// Achievement progress.
    #[serde(default)]
    pub achievements: Achievements,
    /// The newest log entries.
    #[serde(default)]
    pub log: Vec<LogEntry>,
    /// Id the next log entry will get.
    #[serde(default)]
    pub next_log_id: u64,
    /// The leg in progress, with its remaining time captured.
    #[serde(default)]
    pub travel: Option<TravelInfo>,
}

impl Snapshot {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> PersistResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document, migrating older schema versions.
    pub fn from_json(json: &str) -> PersistResult<Self> {
        let mut value: Value = serde_json::from_str(json)?;
        let found = value.get("version").and_then(Value::as_u64).unwrap_or(0);
        if found > u64::from(SNAPSHOT_VERSION) {
            return Err(PersistError::UnsupportedVersion {
                found,
                supported: SNAPSHOT_VERSION,
            });
        }
        if found == 0 {
            migrate_v0(&mut value);
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Version 0 documents lack `version` and `next_log_id`.
fn migrate_v0(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };
    if !obj.contains_key("next_log_id") {
        let next = obj
            .get("log")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|e| e.get("id").and_then(Value::as_u64))
            .max()
            .map_or(1, |id| id.saturating_add(1));
        obj.insert("next_log_id".to_string(), Value::from(next));
    }
    obj.insert("version".to_string(), Value::from(SNAPSHOT_VERSION));
    log::debug!("migrated version 0 snapshot");
}

/// Synchronous key-value storage for snapshots.
pub trait StateStore: std::fmt::Debug {
    /// Read the document under `key`, if any.
    fn get(&self, key: &str) -> PersistResult<Option<String>>;

    /// Overwrite the document under `key`.
    fn set(&mut self, key: &str, value: &str) -> PersistResult<()>;
}

/// In-memory store. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PersistResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// A store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file a key is stored in.
    pub fn path_for(&self, key: &str) -> PersistResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> PersistResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::LogKind;
    use sso_core::Coord;

    fn snapshot() -> Snapshot {
        let grid = Grid::from_kinds(&[vec![sso_core::SectorKind::Empty; 2]]).unwrap();
        Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: None,
            ship: Ship::new(Coord::new(0, 0)),
            grid,
            achievements: Achievements::new(),
            log: vec![LogEntry {
                id: 4,
                kind: LogKind::System,
                text: "Saved.".to_string(),
                at_ms: 0,
                typing: false,
            }],
            next_log_id: 5,
            travel: None,
        }
    }

    #[test]
    fn json_roundtrip() {
        let snap = snapshot();
        let back = Snapshot::from_json(&snap.to_json().unwrap()).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn newer_version_rejected() {
        let mut value = serde_json::to_value(snapshot()).unwrap();
        value["version"] = Value::from(2);
        let err = Snapshot::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            PersistError::UnsupportedVersion { found: 2, supported: 1 }
        ));
    }

    #[test]
    fn version_zero_migrated() {
        let mut value = serde_json::to_value(snapshot()).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("version");
        obj.remove("next_log_id");
        obj.remove("achievements");
        let snap = Snapshot::from_json(&value.to_string()).unwrap();
        assert_eq!(snap.version, SNAPSHOT_VERSION);
        assert_eq!(snap.next_log_id, 5);
        assert_eq!(snap.achievements.unlocked_count(), 0);
    }

    #[test]
    fn version_zero_migration_saturates_log_id() {
        let mut value = serde_json::to_value(snapshot()).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("version");
        obj.remove("next_log_id");
        value["log"][0]["id"] = serde_json::Value::from(u64::MAX);
        let snap = Snapshot::from_json(&value.to_string()).unwrap();
        assert_eq!(snap.next_log_id, u64::MAX);
    }

    #[test]
    fn garbage_is_json_error() {
        assert!(matches!(
            Snapshot::from_json("not json"),
            Err(PersistError::Json(_))
        ));
    }

    #[test]
    fn memory_store_shares_between_clones() {
        let mut a = MemoryStore::new();
        let b = a.clone();
        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(b.get("missing").unwrap(), None);
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("saves"));
        assert_eq!(store.get("game").unwrap(), None);
        store.set("game", "{}").unwrap();
        assert_eq!(store.get("game").unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("saves/game.json").exists());
    }

    #[test]
    fn file_store_rejects_path_keys() {
        let store = FileStore::new(".");
        assert!(matches!(
            store.path_for("../escape"),
            Err(PersistError::InvalidKey(_))
        ));
    }
}
