//! level-time REST server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──HTTP──▶ http::server ──▶ handlers ──▶ api::{Timers, Groups}
//!                                                         │
//!                                                   store::Sublevel
//!                                                         │
//!                                  ┌──────────────────────┴────────────┐
//!                                  ▼                                   ▼
//!                          store::RemoteStore ──RPC──▶ level-time-backend
//!                                                      (rpc::BackendServer
//!                                                       over store::FileStore)
//!                                  or store::MemoryStore (--in-memory)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use level_time::api::Api;
use level_time::http::HttpServer;
use level_time::lifecycle::{self, Shutdown};
use level_time::store::{KvStore, MemoryStore, RemoteStore};

#[derive(Parser)]
#[command(name = "level-time", version, about = "Time tracking REST server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "LEVEL_TIME_CONFIG")]
    config: Option<PathBuf>,

    /// Keep data in process memory instead of the storage backend
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = lifecycle::bootstrap(args.config.as_deref())?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "level-time starting");

    let store: Arc<dyn KvStore> = if args.in_memory {
        tracing::warn!("Using in-memory storage; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let options = config.backend.remote_options();
        tracing::info!(
            address = %options.address,
            auth = options.credentials.is_some(),
            "Connecting to storage backend"
        );
        Arc::new(RemoteStore::connect(options).await?)
    };

    let listener = lifecycle::bind(&config.http.bind_address, "http").await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config.http.clone(), Api::new(store));
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
