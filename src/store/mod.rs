//! Persisted key-value storage shared by every cache kind.
//!
//! Each cache owns its own key namespace (`stats:`, `scouting:`, `narrative:`).
//! Writers are last-write-wins; a failed write never fails the caller's
//! computation, it only means the value stays memory-only.

pub mod file;
pub mod memory;
pub mod narrative;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use narrative::NarrativeCache;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize value for '{key}': {source}")]
    Serialize { key: String, source: serde_json::Error },

    #[error("cached value for '{key}' is corrupt: {source}")]
    Corrupt { key: String, source: serde_json::Error },

    #[error("quota exceeded writing '{key}': {needed} bytes needed, quota is {quota}")]
    QuotaExceeded { key: String, needed: usize, quota: usize }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Removes every key starting with `prefix`, returning how many were dropped.
    async fn clear_prefix(&self, prefix: &str) -> Result<usize, StoreError>;
}

/// Reads and deserializes `key`. A payload that does not parse is reported as
/// [`StoreError::Corrupt`] so the caller can clear it and recompute.
pub async fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source
        })
    }
}

pub async fn set_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
        key: key.to_string(),
        source
    })?;

    store.set(key, raw).await
}

#[cfg(test)]
mod tests {
    use crate::store::{get_json, set_json, KeyValueStore, MemoryStore, StoreError};

    #[tokio::test]
    async fn test_json_round_trip() {
        let store = MemoryStore::new();
        set_json(&store, "stats:pitching:2020", &vec![1, 2, 3]).await.unwrap();

        let value: Option<Vec<i32>> = get_json(&store, "stats:pitching:2020").await.unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_reported() {
        let store = MemoryStore::new();
        store.set("stats:batting:2019", "{not json".to_string()).await.unwrap();

        let result: Result<Option<Vec<i32>>, StoreError> = get_json(&store, "stats:batting:2019").await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        let value: Option<String> = get_json(&store, "nothing").await.unwrap();

        assert!(value.is_none());
    }
}
