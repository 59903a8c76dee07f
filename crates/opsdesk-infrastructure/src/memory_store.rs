//! In-memory key-value store.
//!
//! The testing default for the [`KeyValueStore`] capability. Nothing is
//! persisted; clones share state.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use opsdesk_core::store::KeyValueStore;

/// A `KeyValueStore` backed by a process-local map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();

        assert!(store.get("missing").await.unwrap().is_none());

        store.set("k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));

        store.set("k", json!([1, 2])).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!([1, 2])));

        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());

        // Removing an unknown key is a no-op.
        store.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let clone = store.clone();

        store.set("k", json!("v")).await.unwrap();
        assert_eq!(clone.get("k").await.unwrap(), Some(json!("v")));
    }
}
