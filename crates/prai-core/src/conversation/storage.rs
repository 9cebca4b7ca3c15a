use crate::error::{PraiError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Synchronous byte-string slots addressed by name.
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the slot has never been written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replaces the slot's content.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Stores each slot as `<dir>/<key>.json`.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a file store using the default directory (~/.prai/)
    pub fn new() -> Result<Self> {
        Self::with_dir(Self::default_dir()?)
    }

    /// Create a file store rooted at a custom directory (useful for testing)
    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| {
            PraiError::storage(format!(
                "Failed to create storage directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;

        Ok(Self { base_dir })
    }

    pub fn default_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            PraiError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(".prai"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.slot_path(key);

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PraiError::storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.slot_path(key);

        // Readers only ever see the old or the new content.
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value).map_err(|e| {
            PraiError::storage(format!("Failed to write temporary slot file: {}", e))
        })?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            PraiError::storage(format!("Failed to rename slot file: {}", e))
        })?;

        Ok(())
    }
}

/// In-process slots, lost when dropped.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        if let Ok(mut slots) = store.slots.lock() {
            slots.insert(key.into(), value.into());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| PraiError::storage("memory store lock poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| PraiError::storage("memory store lock poisoned"))?;
        slots.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }
}
