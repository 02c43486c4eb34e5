use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use crate::core::error::ChatError;

/// Key/value text persistence consumed by the credential store and the
/// model registry. Implementations are last-writer-wins; no locking
/// beyond what each call needs.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, ChatError>;
    fn save(&self, key: &str, value: &str) -> Result<(), ChatError>;
}

/// File-backed store: one YAML map at `~/.sparkchat/store.yaml`.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new() -> Self {
        let dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sparkchat");
        Self::with_path(dir.join("store.yaml"))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> HashMap<String, String> {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        match serde_yml::from_str(&contents) {
            Ok(map) => map,
            Err(err) => {
                // A corrupt store file starts over empty rather than
                // blocking every load.
                warn!(path = %self.path.display(), %err, "could not parse store file");
                HashMap::new()
            }
        }
    }

    fn write_all(&self, map: &HashMap<String, String>) -> Result<(), ChatError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_yml::to_string(map)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, ChatError> {
        Ok(self.read_all().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let mut map = self.read_all();
        map.insert(key.to_string(), value.to_string());
        self.write_all(&map)
    }
}

/// In-memory store for tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, ChatError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ChatError::Storage("store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ChatError::Storage("store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.load("missing").unwrap(), None);
        store.save("api_keys", "{}").unwrap();
        assert_eq!(store.load("api_keys").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn file_store_round_trips_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_path(dir.path().join("store.yaml"));

        assert_eq!(store.load("active_model").unwrap(), None);
        store.save("active_model", "openai/gpt-4o").unwrap();
        store.save("active_model", "deepseek/deepseek-v2").unwrap();
        assert_eq!(
            store.load("active_model").unwrap().as_deref(),
            Some("deepseek/deepseek-v2")
        );

        // A second handle over the same path sees persisted values.
        let reopened = FileStore::with_path(dir.path().join("store.yaml"));
        assert_eq!(
            reopened.load("active_model").unwrap().as_deref(),
            Some("deepseek/deepseek-v2")
        );
    }

    #[test]
    fn corrupt_store_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.yaml");
        fs::write(&path, ":: not yaml {{{{").unwrap();

        let store = FileStore::with_path(path);
        assert_eq!(store.load("anything").unwrap(), None);
        store.save("anything", "value").unwrap();
        assert_eq!(store.load("anything").unwrap().as_deref(), Some("value"));
    }
}
