//! REST front-end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, metrics, JSON body decoding)
//!     → handlers/ (timers, groups, docs)
//!     → api (Timers / Groups over the key-value store)
//!     → response.rs (JSON bodies, error → status mapping)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
