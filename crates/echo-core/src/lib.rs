//! # echo-core
//!
//! Shared state for the ws-echo server: the process-wide connection counters
//! and the JSON report served by the status endpoint.
//!
//! This crate has no dependencies on sockets, HTTP, or WebSocket types, so the
//! counter logic can be tested without a network.
//!
//! - **`stats`** – [`ConnectionStats`]: active and peak connection counts,
//!   updated through an RAII [`ConnectionGuard`].
//! - **`report`** – [`StatusReport`]: the `{"max":..,"active":..}` wire form.

pub mod report;
pub mod stats;

// Re-export at the crate root so callers can write `echo_core::ConnectionStats`.
pub use report::StatusReport;
pub use stats::{ConnectionGuard, ConnectionStats, StatsSnapshot};
