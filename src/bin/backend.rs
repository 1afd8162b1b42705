//! level-time storage backend: serves a `FileStore` over the RPC transport.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use level_time::lifecycle::{self, Shutdown};
use level_time::rpc::BackendServer;
use level_time::store::{FileStore, KvStore, MemoryStore};

#[derive(Parser)]
#[command(name = "level-time-backend", version, about = "Key-value storage backend for level-time")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "LEVEL_TIME_CONFIG")]
    config: Option<PathBuf>,

    /// Serve a volatile in-memory store instead of `storage.dest`
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = lifecycle::bootstrap(args.config.as_deref())?;

    let store: Arc<dyn KvStore> = if args.in_memory {
        tracing::warn!("Serving in-memory storage; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let store = FileStore::open(&config.storage.dest).await?;
        tracing::info!(path = %store.path().display(), "Opened store");
        Arc::new(store)
    };

    let credentials = config.backend.credentials();
    if credentials.is_none() {
        tracing::warn!("No backend credentials configured; clients are not authenticated");
    }

    let listener = lifecycle::bind(&config.storage_bind_address(), "storage").await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    BackendServer::new(store, credentials, config.storage.max_connections)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Storage backend stopped");
    Ok(())
}
