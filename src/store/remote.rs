//! `KvStore` client for a remote storage backend.
//!
//! # Design Decisions
//! - One TCP connection, one request in flight at a time
//! - A connection is reused only after a complete, expected reply; anything
//!   else (cancellation, oversized or unexpected frame) discards it
//! - The connection is established lazily and re-established after a
//!   transport failure, with exponential backoff between attempts
//! - Authentication happens once per connection, right after connect

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::resilience::backoff::BackoffPolicy;
use crate::rpc::connection::Connection;
use crate::rpc::frame::{ErrorKind, Request, Response};

use super::{KvStore, Result, StoreError};

/// Shared username/password for the storage backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Connection settings for `RemoteStore`.
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    pub address: String,
    pub credentials: Option<Credentials>,
    pub connect_timeout: Duration,
    pub backoff: BackoffPolicy,
}

impl RemoteOptions {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credentials: None,
            connect_timeout: Duration::from_secs(5),
            backoff: BackoffPolicy::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

/// A `KvStore` reached over the RPC transport.
pub struct RemoteStore {
    options: RemoteOptions,
    connection: Mutex<Option<Connection>>,
}

impl RemoteStore {
    /// Connect (and authenticate) eagerly so misconfiguration surfaces at startup.
    pub async fn connect(options: RemoteOptions) -> Result<Self> {
        let connection = open(&options).await?;
        tracing::info!(address = %options.address, "Connected to storage backend");
        Ok(Self {
            options,
            connection: Mutex::new(Some(connection)),
        })
    }

    /// Round-trip a ping to the backend.
    pub async fn ping(&self) -> Result<()> {
        self.call(Request::Ping, |response| match response {
            Response::Pong => Ok(()),
            other => Err(other),
        })
        .await
    }

    /// Send `request` and decode the reply with `decode`, retrying transport
    /// failures with backoff.
    async fn call<T, F>(&self, request: Request, decode: F) -> Result<T>
    where
        F: Fn(Response) -> std::result::Result<T, Response>,
    {
        let mut guard = self.connection.lock().await;
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.attempt(&mut guard, &request, &decode).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transport() && attempt < self.options.backoff.max_attempts => {
                    let delay = self.options.backoff.delay(attempt);
                    tracing::warn!(
                        address = %self.options.address,
                        op = request.op(),
                        attempt,
                        delay = ?delay,
                        error = %e,
                        "Storage backend unreachable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One exchange on the cached connection (opening one if needed).
    ///
    /// The connection is taken out of `slot` while the request is in flight
    /// and put back only once a complete, expected reply has been read. A call
    /// dropped mid-exchange therefore drops its connection too, and never
    /// leaves a stale reply for the next caller to read.
    async fn attempt<T, F>(&self, slot: &mut Option<Connection>, request: &Request, decode: &F) -> Result<T>
    where
        F: Fn(Response) -> std::result::Result<T, Response>,
    {
        let mut connection = match slot.take() {
            Some(connection) => connection,
            None => open(&self.options).await?,
        };

        match exchange(&mut connection, request).await {
            Ok(response) => {
                let value = decode(response).map_err(unexpected)?;
                *slot = Some(connection);
                Ok(value)
            }
            Err(e @ (StoreError::Unauthorized | StoreError::Remote(_))) => {
                *slot = Some(connection);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

async fn open(options: &RemoteOptions) -> Result<Connection> {
    let socket = tokio::time::timeout(options.connect_timeout, TcpStream::connect(&options.address))
        .await
        .map_err(|_| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("connect to {} timed out", options.address),
            ))
        })??;
    socket.set_nodelay(true)?;
    let mut connection = Connection::new(socket);

    if let Some(credentials) = &options.credentials {
        let auth = Request::Auth {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        };
        match exchange(&mut connection, &auth).await? {
            Response::Ok => {}
            other => return Err(unexpected(other)),
        }
    }

    Ok(connection)
}

async fn exchange(connection: &mut Connection, request: &Request) -> Result<Response> {
    connection.write_frame(request).await?;
    match connection.read_frame::<Response>().await? {
        Some(Response::Error { kind: ErrorKind::Unauthorized, .. }) => Err(StoreError::Unauthorized),
        Some(Response::Error { message, .. }) => Err(StoreError::Remote(message)),
        Some(response) => Ok(response),
        None => Err(StoreError::ConnectionClosed),
    }
}

fn unexpected(response: Response) -> StoreError {
    StoreError::Protocol(format!("unexpected response: {:?}", response))
}

#[async_trait]
impl KvStore for RemoteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.call(Request::Get { key: key.to_string() }, |response| match response {
            Response::Value { value } => Ok(value),
            other => Err(other),
        })
        .await
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let request = Request::Put {
            key: key.to_string(),
            value,
        };
        self.call(request, |response| match response {
            Response::Ok => Ok(()),
            other => Err(other),
        })
        .await
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.call(Request::Del { key: key.to_string() }, |response| match response {
            Response::Ok => Ok(()),
            other => Err(other),
        })
        .await
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        let request = Request::Scan {
            prefix: prefix.to_string(),
        };
        self.call(request, |response| match response {
            Response::Entries { entries } => Ok(entries.into_iter().map(|e| (e.key, e.value)).collect()),
            other => Err(other),
        })
        .await
    }
}
