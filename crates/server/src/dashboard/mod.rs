//! Operator dashboard: live counters served over HTTP and WebSocket.
//!
//! The game server only ever touches [`Metrics`] through atomics; the web
//! side runs on its own tasks and reads snapshots.

pub mod metrics;
pub mod server;

pub use metrics::{Metrics, MetricsSnapshot};
