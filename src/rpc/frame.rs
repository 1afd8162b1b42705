//! RPC frame definitions.
//!
//! One JSON object per line in each direction:
//!
//! ```text
//! → {"op":"put","key":"!groups!foo","value":{"name":"foo"}}
//! ← {"status":"ok"}
//! → {"op":"scan","prefix":"!groups!"}
//! ← {"status":"entries","entries":[{"key":"!groups!foo","value":{"name":"foo"}}]}
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Request sent from a client to the storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Auth { username: String, password: String },
    Ping,
    Get { key: String },
    Put { key: String, value: Value },
    Del { key: String },
    Scan { prefix: String },
}

impl Request {
    /// Short operation name for logs and metrics.
    pub fn op(&self) -> &'static str {
        match self {
            Request::Auth { .. } => "auth",
            Request::Ping => "ping",
            Request::Get { .. } => "get",
            Request::Put { .. } => "put",
            Request::Del { .. } => "del",
            Request::Scan { .. } => "scan",
        }
    }
}

/// A single key/value pair in a scan result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: Value,
}

/// Response returned by the storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Pong,
    /// `value` is absent for a missing key and `null` for a stored null.
    Value {
        #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    Entries { entries: Vec<Entry> },
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error {
            kind,
            message: message.into(),
        }
    }
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    BadRequest,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Unauthorized => write!(f, "unauthorized"),
            ErrorKind::BadRequest => write!(f, "bad request"),
            ErrorKind::Internal => write!(f, "internal error"),
        }
    }
}
