//! Durable store: append-only JSON-lines log with an in-memory sorted index.
//!
//! Every `put` appends `{"key": .., "value": ..}` and every `del` appends a
//! tombstone `{"key": .., "deleted": true}`; only `deleted` marks a removal,
//! so a stored JSON `null` survives replay. On open the log is replayed into
//! a `BTreeMap` and rewritten with only the live entries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::memory::scan_prefix;
use super::{KvStore, Result, StoreError};

const LOG_FILE: &str = "store.log";

#[derive(Debug, Serialize, Deserialize)]
struct LogRecord {
    key: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    value: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    deleted: bool,
}

struct Inner {
    index: BTreeMap<String, Value>,
    log: File,
}

/// A `KvStore` persisted under a directory.
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl FileStore {
    /// Open (or create) the store rooted at `dir`.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;
        let path = dir.join(LOG_FILE);

        let index = match fs::read_to_string(&path).await {
            Ok(content) => replay(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        compact(&path, &index).await?;

        let log = OpenOptions::new().create(true).append(true).open(&path).await?;

        tracing::info!(path = %path.display(), keys = index.len(), "File store opened");

        Ok(Self {
            path,
            inner: Mutex::new(Inner { index, log }),
        })
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(log: &mut File, record: &LogRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        log.write_all(&line).await?;
        log.flush().await?;
        Ok(())
    }
}

fn replay(content: &str) -> Result<BTreeMap<String, Value>> {
    let mut index = BTreeMap::new();
    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: LogRecord = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                // A torn final write is expected after a crash; anything earlier is corruption.
                if n + 1 == content.lines().count() {
                    tracing::warn!(line = n + 1, error = %e, "Discarding truncated log record");
                    break;
                }
                return Err(StoreError::Serialization(e));
            }
        };
        if record.deleted {
            index.remove(&record.key);
        } else {
            index.insert(record.key, record.value);
        }
    }
    Ok(index)
}

async fn compact(path: &Path, index: &BTreeMap<String, Value>) -> Result<()> {
    let tmp = path.with_extension("log.tmp");
    let mut out = Vec::new();
    for (key, value) in index {
        let record = LogRecord {
            key: key.clone(),
            value: value.clone(),
            deleted: false,
        };
        serde_json::to_writer(&mut out, &record)?;
        out.push(b'\n');
    }
    fs::write(&tmp, &out).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.inner.lock().await.index.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let record = LogRecord {
            key: key.to_string(),
            value: value.clone(),
            deleted: false,
        };
        Self::append(&mut inner.log, &record).await?;
        inner.index.insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.index.contains_key(key) {
            return Ok(());
        }
        let record = LogRecord {
            key: key.to_string(),
            value: Value::Null,
            deleted: true,
        };
        Self::append(&mut inner.log, &record).await?;
        inner.index.remove(key);
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        Ok(scan_prefix(&self.inner.lock().await.index, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.put("a", json!({"title": "x"})).await.unwrap();
            store.put("b", json!(2)).await.unwrap();
            store.put("a", json!({"title": "y"})).await.unwrap();
            store.del("b").await.unwrap();
        }

        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"title": "y"})));
        assert!(store.get("b").await.unwrap().is_none());
        assert_eq!(store.scan("").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_compacts_log() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = FileStore::open(dir.path()).await.unwrap();
            for i in 0..10 {
                store.put("k", json!(i)).await.unwrap();
            }
        }

        let store = FileStore::open(dir.path()).await.unwrap();
        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert_eq!(store.get("k").await.unwrap(), Some(json!(9)));
    }

    #[tokio::test]
    async fn null_value_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.put("k", Value::Null).await.unwrap();
            assert_eq!(store.get("k").await.unwrap(), Some(Value::Null));
        }

        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(Value::Null));
        assert_eq!(store.scan("").await.unwrap(), vec![("k".to_string(), Value::Null)]);
    }

    #[test]
    fn replay_drops_truncated_tail() {
        let log = "{\"key\":\"a\",\"value\":1}\n{\"key\":\"b\",\"val";
        let index = replay(log).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a"), Some(&json!(1)));
    }

    #[test]
    fn replay_rejects_corruption_before_tail() {
        let log = "garbage\n{\"key\":\"a\",\"value\":1}\n";
        assert!(replay(log).is_err());
    }
}
