//! In-memory sorted store.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{KvStore, Result};

/// A `KvStore` backed by a `BTreeMap`. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Collect every entry of `map` whose key starts with `prefix`.
pub(crate) fn scan_prefix(map: &BTreeMap<String, Value>, prefix: &str) -> Vec<(String, Value)> {
    map.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.inner.write().await.remove(key);
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        Ok(scan_prefix(&*self.inner.read().await, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_del() {
        let store = MemoryStore::new();
        assert!(store.get("a").await.unwrap().is_none());

        store.put("a", json!({"n": 1})).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"n": 1})));

        store.del("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());

        // Missing keys delete silently
        store.del("a").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn scan_is_sorted_and_prefix_bounded() {
        let store = MemoryStore::new();
        for key in ["b2", "a1", "b1", "c1", "b10"] {
            store.put(key, json!(key)).await.unwrap();
        }

        let keys: Vec<String> = store
            .scan("b")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["b1", "b10", "b2"]);

        assert_eq!(store.scan("").await.unwrap().len(), 5);
        assert!(store.scan("z").await.unwrap().is_empty());
    }
}
