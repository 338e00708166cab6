//! echo-server library crate.
//!
//! A WebSocket echo service with a status endpoint that reports how many echo
//! sessions are open and the highest number that have ever been open at once.
//!
//! # Architecture
//!
//! ```text
//! Client (HTTP / WebSocket, port 9000)
//!         ↕
//! [echo-server]
//!   ├── domain/           ServerConfig, Route
//!   ├── application/      Upgrade validation, status rendering
//!   └── infrastructure/
//!         ├── http_server/  TCP accept loop + hyper HTTP/1 service
//!         └── echo_session/ Per-session echo loop (tokio-tungstenite)
//!         ↕
//! [echo-core]             ConnectionStats shared by every task
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain`, `echo-core`, and plain HTTP types.
//! - `infrastructure` owns sockets, tasks, and the WebSocket stream.

/// Domain layer: configuration and request routing (no I/O).
pub mod domain;

/// Application layer: handshake validation and status rendering.
pub mod application;

/// Infrastructure layer: listener, HTTP service, and echo sessions.
pub mod infrastructure;
