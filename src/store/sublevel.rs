//! Prefix-scoped namespaces over a `KvStore`.
//!
//! A sublevel named `timers` nested under the root owns every key starting
//! with `!timers!`; a `foo` sublevel inside it owns `!timers!!foo!`. Scanning
//! a sublevel therefore also yields the entries of all nested sublevels.

use std::sync::Arc;

use serde_json::Value;

use super::{KvStore, Result};

/// Separator framing each namespace segment in a key.
pub const SEPARATOR: char = '!';

/// A view of a `KvStore` restricted to one key prefix.
#[derive(Clone)]
pub struct Sublevel {
    store: Arc<dyn KvStore>,
    prefix: String,
}

impl Sublevel {
    /// The unprefixed root of `store`.
    pub fn root(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            prefix: String::new(),
        }
    }

    /// A nested namespace called `name`.
    pub fn sublevel(&self, name: &str) -> Self {
        Self {
            store: Arc::clone(&self.store),
            prefix: format!("{}{SEPARATOR}{}{SEPARATOR}", self.prefix, name),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.store.get(&self.key(key)).await
    }

    pub async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.store.put(&self.key(key), value).await
    }

    pub async fn del(&self, key: &str) -> Result<()> {
        self.store.del(&self.key(key)).await
    }

    /// Every entry below this prefix, nested sublevels included.
    ///
    /// Returned keys are relative to this sublevel.
    pub async fn entries(&self) -> Result<Vec<(String, Value)>> {
        let entries = self.store.scan(&self.prefix).await?;
        let strip = self.prefix.len();
        Ok(entries
            .into_iter()
            .map(|(k, v)| (k[strip..].to_string(), v))
            .collect())
    }

    /// Every value below this prefix, in key order.
    pub async fn values(&self) -> Result<Vec<Value>> {
        Ok(self
            .store
            .scan(&self.prefix)
            .await?
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }

    /// Delete every key below this prefix. Returns the number of keys removed.
    pub async fn clear(&self) -> Result<usize> {
        let entries = self.store.scan(&self.prefix).await?;
        for (key, _) in &entries {
            self.store.del(key).await?;
        }
        Ok(entries.len())
    }
}

impl std::fmt::Debug for Sublevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sublevel").field("prefix", &self.prefix).finish()
    }
}
