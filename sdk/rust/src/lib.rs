//! HTTP client for the level-time REST server.

mod client;

pub use client::{Consolidation, Group, Result, SdkError, TimeClient, Timer, TimerQuery};
