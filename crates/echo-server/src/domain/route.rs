//! Request routing.
//!
//! Only one path is special: `/ws` is the WebSocket echo endpoint.  Every other
//! path, `/` included, is served by the status page, the same way a catch-all
//! `/` handler behaves in most HTTP routers.

/// Path of the WebSocket echo endpoint.
pub const ECHO_PATH: &str = "/ws";

/// Which handler serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Upgrade to WebSocket and echo frames back.
    Echo,
    /// Return the connection counters as JSON.
    Status,
}

impl Route {
    /// Picks the handler for a request path (query string already stripped).
    pub fn from_path(path: &str) -> Self {
        if path == ECHO_PATH {
            Self::Echo
        } else {
            Self::Status
        }
    }
}
