//! Time tracking over a key-value store.
//!
//! Timers live in groups; both are persisted in a sorted key-value store
//! that is either in-process or reached over a small socket RPC.

pub mod api;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod rpc;
pub mod store;

pub use api::Api;
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rpc::BackendServer;
