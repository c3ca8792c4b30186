//! Persistence: a small local key-value store and the adapter that keeps the
//! forest under one fixed key.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::tree::seed::seed_forest;
use crate::tree::Forest;

/// Key the forest is stored under.
pub const STORAGE_KEY: &str = "lms_data";

/// Synchronous string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    #[allow(dead_code)]
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk mapping keys to string values.
///
/// The file is re-read on every `get` and rewritten atomically (temp file +
/// rename) on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                AppError::Storage(format!("{} is not a key-value file: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        // An unreadable file is replaced rather than blocking every save.
        let mut entries = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable store file");
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Loads and saves the whole forest as one serialized value.
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persistence over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::default()))
    }

    /// Read the stored forest, seeding (and saving) a default one when the
    /// value is absent or cannot be decoded.
    pub fn load(&mut self) -> Forest {
        let stored = match self.store.get(STORAGE_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "store unreadable, starting from seed");
                None
            }
        };

        if let Some(blob) = stored {
            match serde_json::from_str::<Forest>(&blob) {
                Ok(forest) => {
                    tracing::info!(nodes = forest.len(), "loaded forest");
                    return forest;
                }
                Err(e) => tracing::warn!(error = %e, "stored forest is corrupt, reseeding"),
            }
        }

        let forest = seed_forest();
        if let Err(e) = self.save(&forest) {
            tracing::error!(error = %e, "failed to save seed forest");
        }
        forest
    }

    pub fn save(&mut self, forest: &Forest) -> Result<()> {
        let blob = serde_json::to_string(forest)?;
        self.store.set(STORAGE_KEY, blob)
    }

    /// Overwrite whatever is stored with a fresh seed.
    pub fn reset(&mut self) -> Result<Forest> {
        let forest = seed_forest();
        self.save(&forest)?;
        tracing::info!("store reset to seed forest");
        Ok(forest)
    }
}
