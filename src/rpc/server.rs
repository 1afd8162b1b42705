//! Storage backend server.
//!
//! # Responsibilities
//! - Accept TCP connections, bounded by `max_connections`
//! - Run one task per connection reading request frames
//! - Enforce the shared username/password when configured
//! - Dispatch data operations to the wrapped `KvStore`

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Semaphore};

use crate::observability::metrics;
use crate::rpc::connection::Connection;
use crate::rpc::frame::{Entry, ErrorKind, Request, Response};
use crate::store::{Credentials, KvStore, StoreError};

static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Serves a `KvStore` to `RemoteStore` clients.
pub struct BackendServer {
    store: Arc<dyn KvStore>,
    credentials: Option<Credentials>,
    max_connections: usize,
}

impl BackendServer {
    pub fn new(store: Arc<dyn KvStore>, credentials: Option<Credentials>, max_connections: usize) -> Self {
        Self {
            store,
            credentials,
            max_connections,
        }
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = self.max_connections,
            auth = self.credentials.is_some(),
            "Storage backend listening"
        );

        let limit = Arc::new(Semaphore::new(self.max_connections));
        let credentials = Arc::new(self.credentials);

        loop {
            let permit = tokio::select! {
                permit = Arc::clone(&limit).acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
                _ = shutdown.recv() => break,
            };

            let (socket, peer) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(a) => a,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                },
                _ = shutdown.recv() => break,
            };

            let mut handler = Handler {
                id: CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
                peer,
                store: Arc::clone(&self.store),
                credentials: Arc::clone(&credentials),
                authenticated: false,
            };

            let shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                if let Err(e) = handler.run(socket, shutdown).await {
                    tracing::debug!(connection_id = handler.id, error = %e, "Connection ended with error");
                }
                drop(permit);
            });
        }

        tracing::info!("Storage backend stopped");
        Ok(())
    }
}

struct Handler {
    id: u64,
    peer: SocketAddr,
    store: Arc<dyn KvStore>,
    credentials: Arc<Option<Credentials>>,
    authenticated: bool,
}

impl Handler {
    async fn run(&mut self, socket: TcpStream, mut shutdown: broadcast::Receiver<()>) -> Result<(), StoreError> {
        tracing::debug!(connection_id = self.id, peer = %self.peer, "Connected");
        let mut connection = Connection::new(socket);

        loop {
            let frame = tokio::select! {
                frame = connection.read_frame() => frame,
                _ = shutdown.recv() => break,
            };
            let request: Request = match frame {
                Ok(Some(r)) => r,
                Ok(None) => break,
                Err(StoreError::Protocol(msg)) => {
                    connection
                        .write_frame(&Response::error(ErrorKind::BadRequest, msg.clone()))
                        .await?;
                    return Err(StoreError::Protocol(msg));
                }
                Err(e) => return Err(e),
            };

            let op = request.op();
            let response = self.apply(request).await;
            let outcome = match &response {
                Response::Error { kind, .. } => kind.to_string(),
                _ => "ok".to_string(),
            };
            metrics::record_backend_op(op, &outcome);

            connection.write_frame(&response).await?;
        }

        tracing::debug!(connection_id = self.id, peer = %self.peer, "Disconnected");
        Ok(())
    }

    async fn apply(&mut self, request: Request) -> Response {
        let is_auth = matches!(request, Request::Auth { .. });
        if self.credentials.is_some() && !self.authenticated && !is_auth {
            tracing::warn!(connection_id = self.id, op = request.op(), "Rejected unauthenticated request");
            return Response::error(ErrorKind::Unauthorized, "Unauthorized");
        }

        let result = match request {
            Request::Auth { username, password } => return self.authenticate(&username, &password),
            Request::Ping => Ok(Response::Pong),
            Request::Get { key } => self.store.get(&key).await.map(|value| Response::Value { value }),
            Request::Put { key, value } => self.store.put(&key, value).await.map(|_| Response::Ok),
            Request::Del { key } => self.store.del(&key).await.map(|_| Response::Ok),
            Request::Scan { prefix } => self.store.scan(&prefix).await.map(|entries| Response::Entries {
                entries: entries
                    .into_iter()
                    .map(|(key, value)| Entry { key, value })
                    .collect(),
            }),
        };

        result.unwrap_or_else(|e| {
            tracing::error!(connection_id = self.id, error = %e, "Store operation failed");
            Response::error(ErrorKind::Internal, e.to_string())
        })
    }

    fn authenticate(&mut self, username: &str, password: &str) -> Response {
        match &*self.credentials {
            Some(expected) if expected.username == username && expected.password == password => {
                self.authenticated = true;
                tracing::debug!(connection_id = self.id, user = %username, "Authenticated");
                Response::Ok
            }
            Some(_) => {
                self.authenticated = false;
                tracing::warn!(connection_id = self.id, user = %username, "Authentication failed");
                Response::error(ErrorKind::Unauthorized, "Unauthorized")
            }
            None => Response::Ok,
        }
    }
}
