//! Server configuration.
//!
//! [`ServerConfig`] is built once at startup from the CLI arguments (see
//! `main.rs`) and passed by value to [`run_server`].
//!
//! [`run_server`]: crate::infrastructure::run_server

use std::net::{Ipv4Addr, SocketAddr};

/// TCP port the server listens on when none is given.
pub const DEFAULT_PORT: u16 = 9000;

/// All runtime configuration for the echo server.
///
/// # Example
///
/// ```rust
/// use echo_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 9000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address and port the listener binds to.
    ///
    /// `0.0.0.0` accepts connections on every interface.
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    /// `0.0.0.0:9000`.
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
        }
    }
}
