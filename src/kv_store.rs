//! Durable key-value store backing the widget.
//!
//! Every value lives under a logical key (see [`keys`]) as a JSON value.
//! [`JsonFileStore`] keeps the whole map in one JSON document and rewrites it
//! atomically on each write, so a reader never observes a half-written file.
use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use log::{debug, error, trace, warn};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::{MemoError, Result};

/// Logical keys of the persisted state.
pub mod keys {
    pub const NOTES: &str = "notes";
    pub const LOCKED: &str = "locked";
    pub const PINNED: &str = "pinned";
    pub const POS_X: &str = "pos-x";
    pub const POS_Y: &str = "pos-y";
}

/// A local, durable key-value store.
///
/// Implementations synchronize internally so one instance can be shared
/// between the widget and background tasks.
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`. The write is complete when this returns.
    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.set_many(vec![(key, value)])
    }

    /// Stores all `entries` in one write: either every key is updated or none is.
    fn set_many(&self, entries: Vec<(&str, Value)>) -> Result<()>;
}

/// Store handle shared by the widget components.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Reads and decodes the value under `key`.
///
/// `Ok(None)` means the key is absent; `Err` means a value exists but does not
/// decode as `T`.
pub fn read_value<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key) {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encodes `value` and stores it under `key`.
pub fn write_value<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let encoded = serde_json::to_value(value)?;
    store.set(key, encoded)
}

/// Reads a boolean flag, treating absent or malformed values as `default`.
pub fn read_flag(store: &dyn KeyValueStore, key: &str, default: bool) -> bool {
    match read_value::<bool>(store, key) {
        Ok(Some(flag)) => flag,
        Ok(None) => default,
        Err(e) => {
            warn!("Ignoring malformed value for '{}': {}", key, e);
            default
        }
    }
}

/// A [`KeyValueStore`] persisted as a single JSON object on disk.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Opens the store at `path`.
    ///
    /// A missing file yields an empty store. A file that is not a JSON object
    /// is logged and treated as empty; it is only replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Opening key-value store at {}", path.display());

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, Value>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        "Store file {} is not a JSON object, starting empty: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Store file {} does not exist yet", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                error!("Failed to read store file {}: {}", path.display(), e);
                return Err(MemoError::Io(e));
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `entries` to a temp file next to the target and renames it over.
    fn write_atomically(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create directory {}: {}", dir.display(), e);
                MemoError::DirectoryError {
                    path: dir.to_path_buf(),
                }
            })?;
        }

        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            MemoError::Io(e)
        })?;

        let json = serde_json::to_string_pretty(entries)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file.flush()?;

        temp_file.persist(&self.path).map_err(|e| {
            error!("Failed to persist file {}: {}", self.path.display(), e.error);
            MemoError::Io(e.error)
        })?;

        trace!("Store written to {}", self.path.display());
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        match self.entries.lock() {
            Ok(entries) => entries.get(key).cloned(),
            Err(e) => {
                warn!("Store lock poisoned while reading '{}': {}", key, e);
                None
            }
        }
    }

    fn set_many(&self, updates: Vec<(&str, Value)>) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|e| MemoError::ApplicationError {
            message: format!("Store lock poisoned: {}", e),
        })?;

        // Only take the new values once they are on disk.
        let mut next = entries.clone();
        for (key, value) in updates {
            next.insert(key.to_string(), value);
        }
        self.write_atomically(&next)?;
        *entries = next;
        Ok(())
    }
}

/// In-memory store. Counts writes and can be told to fail them, which makes
/// it the store of choice for exercising persistence behaviour.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
    fail_after: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a key without counting it as a write.
    pub fn seed(&self, key: &str, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Lets `n` more writes succeed, then fails every one after that.
    pub fn fail_writes_after(&self, n: usize) {
        if let Ok(mut budget) = self.fail_after.lock() {
            *budget = Some(n);
        }
    }

    fn write_allowed(&self) -> bool {
        if self.fail_writes.load(Ordering::SeqCst) {
            return false;
        }
        match self.fail_after.lock() {
            Ok(mut budget) => match budget.as_mut() {
                Some(0) => false,
                Some(left) => {
                    *left -= 1;
                    true
                }
                None => true,
            },
            Err(_) => false,
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok().and_then(|e| e.get(key).cloned())
    }

    fn set_many(&self, updates: Vec<(&str, Value)>) -> Result<()> {
        if !self.write_allowed() {
            return Err(MemoError::Io(std::io::Error::new(
                ErrorKind::Other,
                "simulated write failure",
            )));
        }
        let mut entries = self.entries.lock().map_err(|e| MemoError::ApplicationError {
            message: format!("Store lock poisoned: {}", e),
        })?;
        for (key, value) in updates {
            entries.insert(key.to_string(), value);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = JsonFileStore::open(&path).unwrap();
        write_value(&store, keys::LOCKED, &true).unwrap();
        write_value(&store, keys::POS_X, &120).unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert!(read_flag(&reopened, keys::LOCKED, false));
        assert_eq!(read_value::<i32>(&reopened, keys::POS_X).unwrap(), Some(120));
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn garbage_file_opens_as_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.get(keys::NOTES).is_none());
    }

    #[test]
    fn malformed_flag_falls_back_to_default() {
        let store = MemoryStore::new();
        store.seed(keys::PINNED, json!("yes"));
        assert!(!read_flag(&store, keys::PINNED, false));
        assert!(read_value::<bool>(&store, keys::PINNED).is_err());
    }

    #[test]
    fn memory_store_counts_only_successful_writes() {
        let store = MemoryStore::new();
        store.set("a", json!(1)).unwrap();
        store.set_fail_writes(true);
        assert!(store.set("a", json!(2)).is_err());
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get("a"), Some(json!(1)));
    }

    #[test]
    fn batched_write_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.set_many(vec![("x", json!(1)), ("y", json!(1))]).unwrap();
        store.fail_writes_after(0);

        assert!(store.set_many(vec![("x", json!(2)), ("y", json!(2))]).is_err());
        assert_eq!(store.get("x"), Some(json!(1)));
        assert_eq!(store.get("y"), Some(json!(1)));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn file_store_batches_into_one_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonFileStore::open(&path).unwrap();

        store
            .set_many(vec![(keys::POS_X, json!(10)), (keys::POS_Y, json!(20))])
            .unwrap();

        let on_disk: BTreeMap<String, Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get(keys::POS_X), Some(&json!(10)));
        assert_eq!(on_disk.get(keys::POS_Y), Some(&json!(20)));
    }

    #[test]
    fn failed_file_write_keeps_previous_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonFileStore::open(&path).unwrap();
        write_value(&store, keys::LOCKED, &false).unwrap();

        // the target path becomes a directory, so the rename fails
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(write_value(&store, keys::LOCKED, &true).is_err());
        assert!(!read_flag(&store, keys::LOCKED, true));
    }
}
