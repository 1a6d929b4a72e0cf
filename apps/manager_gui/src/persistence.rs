//! Local key-value snapshot storage for the entry lists.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
#[cfg(test)]
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::{Context, Result};
use serde_json::Value;

/// String-valued key-value store. Writes are synchronous and last-write-wins.
pub trait SnapshotStore: Send {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// All keys live in one JSON object on disk. Every write rewrites the file
/// through a temporary sibling and a rename.
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

    fn read_all(&self) -> Result<Option<BTreeMap<String, Value>>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read '{}'", self.path.display()))
            }
        };
        let entries = serde_json::from_str(&raw)
            .with_context(|| format!("'{}' is not a JSON object", self.path.display()))?;
        Ok(Some(entries))
    }
}

impl SnapshotStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let Some(entries) = self.read_all()? else {
            return Ok(None);
        };
        Ok(entries.get(key).map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries.unwrap_or_default(),
            Err(err) => {
                tracing::warn!("replacing unreadable snapshot file: {err:#}");
                BTreeMap::new()
            }
        };
        entries.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create snapshot directory '{}'", parent.display())
            })?;
        }

        let serialized = serde_json::to_vec_pretty(&entries)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serialized)
            .with_context(|| format!("failed to write '{}'", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("failed to replace '{}'", self.path.display()))?;
        Ok(())
    }
}

/// Shared in-memory store for tests; clones see the same entries.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[cfg(test)]
impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/persistence_tests.rs"]
mod tests;
