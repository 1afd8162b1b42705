//! Key-value storage subsystem.
//!
//! # Data Flow
//! ```text
//! Api layer
//!     → sublevel.rs (prefix-scoped namespaces: "!timers!!<group>!<id>")
//!     → KvStore (sorted map, JSON values)
//!         → memory.rs (BTreeMap, tests and --in-memory)
//!         → file.rs   (append-only log + in-memory index)
//!         → remote.rs (RPC client to a storage backend)
//! ```
//!
//! # Design Decisions
//! - Keys are UTF-8 strings, values are JSON documents
//! - `scan` returns entries in ascending key order
//! - Deleting a missing key is not an error

pub mod file;
pub mod memory;
pub mod remote;
pub mod sublevel;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use remote::{Credentials, RemoteOptions, RemoteStore};
pub use sublevel::Sublevel;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by storage implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection to storage backend closed")]
    ConnectionClosed,

    #[error("Storage backend error: {0}")]
    Remote(String),
}

impl StoreError {
    /// Whether the failure came from the transport and a fresh connection may succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::ConnectionClosed)
    }
}

/// A sorted key-value map with JSON values.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Remove `key`.
    async fn del(&self, key: &str) -> Result<()>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Value)>>;
}
