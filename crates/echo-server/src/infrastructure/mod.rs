//! Infrastructure layer for echo-server.
//!
//! Everything that touches a socket or spawns a task lives here.
//!
//! # Responsibilities
//!
//! - Binding the TCP listener
//! - Serving HTTP/1 on each accepted connection (hyper)
//! - Switching `/ws` connections to WebSocket (tokio-tungstenite)
//! - Running one echo task per WebSocket session

pub mod echo_session;
pub mod http_server;

// Re-export the entry points so `main.rs` and the tests can call them concisely.
pub use echo_session::{echo_socket_config, run_echo_session};
pub use http_server::{run_server, serve};
