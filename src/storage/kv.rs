//! Durable key-value storage.

use crate::error::{Result, StudioError};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// String key-value storage that outlives the process.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Key-value store backed by a single JSON object file.
///
/// Every write rewrites the whole file through a sibling temp file, so a
/// crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// File name used inside a data directory.
    pub const FILE_NAME: &'static str = "storage.json";

    /// Opens (without creating) the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Opens the store inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a corrupt file is moved before it is replaced.
    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.bak")
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StudioError::Storage(format!("{} is corrupt: {}", self.path.display(), e))
        })
    }

    /// Like `read_map`, but a corrupt file is moved aside and replaced by
    /// an empty map so writes can go through.
    fn read_map_for_write(&self) -> Result<BTreeMap<String, String>> {
        match self.read_map() {
            Err(StudioError::Storage(reason)) => {
                let backup = self.backup_path();
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    %reason,
                    "Discarding corrupt storage file"
                );
                std::fs::rename(&self.path, &backup)?;
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map_for_write()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }
}

/// In-process store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.map.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        JsonFileStore::in_dir(dir.path()).set("a", "1").unwrap();
        JsonFileStore::in_dir(dir.path()).set("b", "2").unwrap();

        let reopened = JsonFileStore::in_dir(dir.path());
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("2"));
        assert!(!dir.path().join("storage.json.tmp").exists());
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path().join("nested").join("deeper"));
        store.set("k", "v").unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        std::fs::write(store.path(), "[not an object").unwrap();

        let err = store.get("k").unwrap_err();
        assert!(matches!(err, StudioError::Storage(_)));
    }

    #[test]
    fn test_file_store_write_recovers_from_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        std::fs::write(store.path(), "{truncated").unwrap();

        store.set("k", "v").unwrap();
        store.set("other", "w").unwrap();

        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("other").unwrap().as_deref(), Some("w"));
        assert_eq!(
            std::fs::read_to_string(store.backup_path()).unwrap(),
            "{truncated"
        );
    }

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemoryStore::new();
        store.set("k", "old").unwrap();
        store.set("k", "new").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("new"));
    }
}
