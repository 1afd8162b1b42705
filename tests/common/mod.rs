//! Shared utilities for integration tests: in-process storage backend and REST server.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use level_time::api::Api;
use level_time::config::HttpConfig;
use level_time::http::HttpServer;
use level_time::lifecycle::Shutdown;
use level_time::rpc::BackendServer;
use level_time::store::{Credentials, KvStore, MemoryStore, RemoteOptions, RemoteStore};
use level_time::resilience::backoff::BackoffPolicy;
use tokio::net::TcpListener;

pub fn credentials() -> Credentials {
    Credentials::new("tester", "hunter2")
}

/// Serve `store` over RPC on an ephemeral port.
pub async fn start_backend(
    store: Arc<dyn KvStore>,
    credentials: Option<Credentials>,
    shutdown: &Shutdown,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = BackendServer::new(store, credentials, 64);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    addr
}

/// Client options with fast retries for tests.
pub fn remote_options(addr: SocketAddr, credentials: Option<Credentials>) -> RemoteOptions {
    let mut options = RemoteOptions::new(addr.to_string()).with_credentials(credentials);
    options.connect_timeout = Duration::from_secs(2);
    options.backoff = BackoffPolicy {
        max_attempts: 5,
        base_delay_ms: 10,
        max_delay_ms: 100,
    };
    options
}

/// Serve the REST Api over `store` on an ephemeral port; returns the base URL.
pub async fn start_http(store: Arc<dyn KvStore>, shutdown: &Shutdown) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(HttpConfig::default(), Api::new(store));
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    format!("http://{}", addr)
}

/// The full stack: REST server → RemoteStore → BackendServer → MemoryStore.
pub struct Stack {
    pub url: String,
    pub backend: SocketAddr,
    pub shutdown: Shutdown,
}

pub async fn start_stack() -> Stack {
    let shutdown = Shutdown::new();
    let backend = start_backend(Arc::new(MemoryStore::new()), Some(credentials()), &shutdown).await;
    let remote = RemoteStore::connect(remote_options(backend, Some(credentials())))
        .await
        .unwrap();
    let url = start_http(Arc::new(remote), &shutdown).await;
    Stack { url, backend, shutdown }
}

impl Drop for Stack {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
