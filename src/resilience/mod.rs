//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Storage call fails with a transport error:
//!     → drop the broken connection
//!     → backoff.rs (wait, exponentially longer each attempt)
//!     → reconnect and retry until max_attempts
//! ```
//!
//! # Design Decisions
//! - Only transport failures are retried; auth and store errors surface at once
//! - Jittered backoff keeps reconnecting clients from synchronising

pub mod backoff;
