use super::{get_json, set_json, KeyValueStore, StoreError};
use crate::model::structures::player_type::PlayerType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeEntry {
    pub text: String,
    /// xxh3 of the serialized input the text was generated from
    pub input_hash: u64
}

/// Generated narrative text per player, reused until the input it was written
/// from changes.
pub struct NarrativeCache {
    store: Arc<dyn KeyValueStore>
}

impl NarrativeCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> NarrativeCache {
        NarrativeCache { store }
    }

    pub fn key(player_id: i32, player_type: PlayerType) -> String {
        format!("narrative:{}:{}", player_id, player_type.as_str())
    }

    /// Hash of any serializable input. Unserializable input hashes as 0, which
    /// never matches a stored entry written from real data.
    pub fn hash_input<T: Serialize + ?Sized>(input: &T) -> u64 {
        match serde_json::to_vec(input) {
            Ok(bytes) => xxh3_64(&bytes),
            Err(e) => {
                warn!("Failed to serialize narrative input: {}", e);
                0
            }
        }
    }

    /// Cached text, but only when it was generated from the same input.
    pub async fn get_fresh<T: Serialize + ?Sized>(
        &self,
        player_id: i32,
        player_type: PlayerType,
        input: &T
    ) -> Option<String> {
        let key = Self::key(player_id, player_type);
        let entry: NarrativeEntry = match get_json(self.store.as_ref(), &key).await {
            Ok(entry) => entry?,
            Err(e) => {
                warn!("Clearing unreadable narrative entry {}: {}", key, e);
                let _ = self.store.remove(&key).await;
                return None;
            }
        };

        if entry.input_hash != Self::hash_input(input) {
            debug!("Narrative for {} is stale", key);
            return None;
        }

        Some(entry.text)
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        player_id: i32,
        player_type: PlayerType,
        input: &T,
        text: String
    ) -> Result<(), StoreError> {
        let entry = NarrativeEntry {
            text,
            input_hash: Self::hash_input(input)
        };

        set_json(self.store.as_ref(), &Self::key(player_id, player_type), &entry).await
    }

    pub async fn invalidate(&self, player_id: i32, player_type: PlayerType) -> Result<(), StoreError> {
        self.store.remove(&Self::key(player_id, player_type)).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::structures::player_type::PlayerType,
        store::{KeyValueStore, MemoryStore, NarrativeCache}
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_text_is_reused_for_same_input() {
        let cache = NarrativeCache::new(Arc::new(MemoryStore::new()));
        let input = vec![3.5, 4.0];

        cache
            .put(7, PlayerType::Starter, &input, "Polished starter".to_string())
            .await
            .unwrap();

        assert_eq!(
            cache.get_fresh(7, PlayerType::Starter, &input).await.as_deref(),
            Some("Polished starter")
        );
    }

    #[tokio::test]
    async fn test_changed_input_is_stale() {
        let cache = NarrativeCache::new(Arc::new(MemoryStore::new()));

        cache
            .put(7, PlayerType::Hitter, &vec![3.5], "Old text".to_string())
            .await
            .unwrap();

        assert!(cache.get_fresh(7, PlayerType::Hitter, &vec![4.0]).await.is_none());
        // Keys are per player type
        assert!(cache.get_fresh(7, PlayerType::Reliever, &vec![3.5]).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_cleared() {
        let store = Arc::new(MemoryStore::new());
        store.set("narrative:9:hitter", "nope".to_string()).await.unwrap();

        let cache = NarrativeCache::new(store.clone());
        assert!(cache.get_fresh(9, PlayerType::Hitter, &1).await.is_none());
        assert!(!store.contains_key("narrative:9:hitter"));
    }

    #[test]
    fn test_key_format() {
        assert_eq!(NarrativeCache::key(12, PlayerType::Reliever), "narrative:12:reliever");
    }
}
