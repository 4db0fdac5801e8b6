use super::{KeyValueStore, StoreError};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    path::{Path, PathBuf}
};
use tokio::sync::Mutex;
use tracing::warn;

/// A single JSON document on disk holding every key.
///
/// The document is loaded lazily on first access and rewritten in full on each
/// mutation (temp file + rename, so a crash never leaves a truncated file).
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Option<HashMap<String, String>>>
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> FileStore {
        FileStore {
            path: path.into(),
            entries: Mutex::new(None)
        }
    }

    /// `<dir>/true_rating_cache.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> FileStore {
        FileStore::new(dir.as_ref().join("true_rating_cache.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> HashMap<String, String> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(_) => return HashMap::new()
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding unreadable cache file {}: {}", self.path.display(), e);
                HashMap::new()
            }
        }
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let json = serde_json::to_string(entries).map_err(|source| StoreError::Serialize {
            key: self.path.display().to_string(),
            source
        })?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut guard = self.entries.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await);
        }

        Ok(guard.as_ref().and_then(|entries| entries.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await);
        }

        let entries = guard.get_or_insert_with(HashMap::new);
        entries.insert(key.to_string(), value);

        self.persist(entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await);
        }

        let entries = guard.get_or_insert_with(HashMap::new);
        if entries.remove(key).is_some() {
            self.persist(entries).await?;
        }

        Ok(())
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let mut guard = self.entries.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await);
        }

        let entries = guard.get_or_insert_with(HashMap::new);
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        let removed = before - entries.len();

        if removed > 0 {
            self.persist(entries).await?;
        }

        Ok(removed)
    }
}
