//! Domain layer for echo-server.
//!
//! Plain types with no dependencies on sockets, HTTP, or the async runtime.

pub mod config;
pub mod route;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use route::Route;
