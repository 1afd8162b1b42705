//! Storage RPC transport.
//!
//! # Data Flow
//! ```text
//! RemoteStore (api process)                 BackendServer (storage process)
//!     Request → connection.rs ──── TCP ───▶ connection.rs → Handler
//!                                               → auth check
//!                                               → KvStore (file / memory)
//!     Response ◀─ connection.rs ◀── TCP ─── connection.rs ◀─┘
//! ```
//!
//! # Design Decisions
//! - Newline-delimited JSON frames (frame.rs), one request in flight per connection
//! - Auth is per connection: an `auth` frame must precede data operations
//!   when the backend has credentials configured

pub mod connection;
pub mod frame;
pub mod server;

pub use connection::Connection;
pub use frame::{Request, Response};
pub use server::BackendServer;
