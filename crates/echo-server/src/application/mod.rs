//! Application layer for echo-server.
//!
//! Decides *what* to answer: whether an upgrade request is acceptable and what
//! the status page says.  Sockets and tasks stay in the infrastructure layer.

pub mod handshake;
pub mod status;

pub use handshake::{upgrade_response, HandshakeError, WEBSOCKET_VERSION};
pub use status::status_body;
