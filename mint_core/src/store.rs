//! Key-value persistence for the host application.
//!
//! The engine never touches storage. Hosts load a [`CycleHistory`] or
//! [`Ledger`] snapshot from a [`KeyValueStore`], hand it to the engine, and
//! write back whatever changed. Writes are last-write-wins.

use crate::config::CycleConfig;
use crate::ledger::Ledger;
use crate::{CycleHistory, Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Storage key for the cycle history
pub const PERIOD_DATA: &str = "periodData";
/// Storage key for ledger transactions
pub const TRANSACTIONS: &str = "transactions";
/// Storage key for app settings
pub const SETTINGS: &str = "settings";
/// Storage key for the user profile
pub const USER_INFO: &str = "userInfo";
/// Storage key for the first launch date
pub const FIRST_USE_DATE: &str = "firstUseDate";

/// Every key the application writes
pub const ALL_KEYS: [&str; 5] = [USER_INFO, TRANSACTIONS, PERIOD_DATA, SETTINGS, FIRST_USE_DATE];

/// A flat get/set store of JSON values
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// In-memory store for tests and embedding
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// One JSON file per key inside a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Store(format!("invalid key {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    /// Read a key with a shared lock
    ///
    /// Unreadable or corrupted files are logged and treated as absent.
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            tracing::debug!("No stored value for {}", key);
            return Ok(None);
        }

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open {:?}: {}. Treating as empty.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock {:?}: {}. Treating as empty.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read {:?}: {}. Treating as empty.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        match serde_json::from_str::<Value>(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}. Treating as empty.", path, e);
                Ok(None)
            }
        }
    }

    /// Atomically replace a key's file
    ///
    /// Writes to a temp file in the same directory under an exclusive lock,
    /// syncs it, then renames it over the old file.
    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(&value)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} to {:?}", key, path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed {:?}", path);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Read and deserialize a typed value
///
/// A value that no longer matches its type is logged and treated as absent.
pub fn load_typed<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(value) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(typed) => Ok(Some(typed)),
        Err(e) => {
            tracing::warn!("Stored {} has an unexpected shape: {}. Ignoring it.", key, e);
            Ok(None)
        }
    }
}

/// Serialize and write a typed value
pub fn save_typed<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    store.set(key, serde_json::to_value(value)?)
}

/// Load the cycle history, seeding a fresh one from config when absent
pub fn load_history(store: &dyn KeyValueStore, seed: &CycleConfig) -> Result<CycleHistory> {
    match load_typed(store, PERIOD_DATA)? {
        Some(history) => Ok(history),
        None => {
            tracing::info!("No cycle history stored, starting fresh");
            Ok(CycleHistory::new(
                seed.default_cycle_length,
                seed.default_flow_length,
            ))
        }
    }
}

pub fn save_history(store: &mut dyn KeyValueStore, history: &CycleHistory) -> Result<()> {
    save_typed(store, PERIOD_DATA, history)
}

/// Load the history, modify it, and save it back
pub fn update_history<F>(
    store: &mut dyn KeyValueStore,
    seed: &CycleConfig,
    f: F,
) -> Result<CycleHistory>
where
    F: FnOnce(&mut CycleHistory) -> Result<()>,
{
    let mut history = load_history(store, seed)?;
    f(&mut history)?;
    save_history(store, &history)?;
    Ok(history)
}

pub fn load_ledger(store: &dyn KeyValueStore) -> Result<Ledger> {
    Ok(load_typed(store, TRANSACTIONS)?.unwrap_or_default())
}

pub fn save_ledger(store: &mut dyn KeyValueStore, ledger: &Ledger) -> Result<()> {
    save_typed(store, TRANSACTIONS, ledger)
}
