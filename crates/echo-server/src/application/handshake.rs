//! WebSocket upgrade validation (RFC 6455 §4.2).
//!
//! hyper hands us the raw HTTP request for `/ws`.  tungstenite's server
//! handshake checks that it really is a WebSocket opening handshake and builds
//! the `101 Switching Protocols` answer, `Sec-WebSocket-Accept` included.  This
//! module adapts hyper's request to that check and turns each way it can fail
//! into an HTTP status.
//!
//! A request that fails any check is answered with a plain HTTP error and
//! never reaches the echo session, so it never touches the counters.

use hyper::header::SEC_WEBSOCKET_KEY;
use hyper::{Method, Request, Response, StatusCode, Version};
use thiserror::Error;
use tokio_tungstenite::tungstenite::{
    error::ProtocolError, handshake::server::create_response, Error as WsError,
};

/// The only WebSocket protocol version the server speaks.
pub const WEBSOCKET_VERSION: &str = "13";

/// Reasons an upgrade request on `/ws` is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    /// The opening handshake must be a `GET`.
    #[error("WebSocket upgrade requires GET, got {0}")]
    MethodNotAllowed(Method),

    /// The opening handshake must be HTTP/1.1 or later.
    #[error("WebSocket upgrade requires HTTP/1.1, got {0:?}")]
    UnsupportedHttpVersion(Version),

    /// No `upgrade` token in the `Connection` header.
    #[error("missing `Connection: upgrade` header")]
    MissingConnectionUpgrade,

    /// `Upgrade` header absent or not `websocket`.
    #[error("missing `Upgrade: websocket` header")]
    MissingUpgradeWebsocket,

    /// `Sec-WebSocket-Key` header absent or blank.
    #[error("missing Sec-WebSocket-Key header")]
    MissingKey,

    /// `Sec-WebSocket-Version` absent or anything other than 13.
    #[error("unsupported WebSocket version, only {WEBSOCKET_VERSION} is spoken")]
    UnsupportedVersion,

    /// Any other handshake failure tungstenite reports.
    #[error("invalid WebSocket handshake: {0}")]
    Invalid(String),
}

impl HandshakeError {
    /// HTTP status to answer the rejected request with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnsupportedVersion => StatusCode::UPGRADE_REQUIRED,
            Self::UnsupportedHttpVersion(_)
            | Self::MissingConnectionUpgrade
            | Self::MissingUpgradeWebsocket
            | Self::MissingKey
            | Self::Invalid(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn from_ws(err: WsError, method: &Method, version: Version) -> Self {
        match err {
            WsError::Protocol(ProtocolError::WrongHttpMethod) => {
                Self::MethodNotAllowed(method.clone())
            }
            WsError::Protocol(ProtocolError::WrongHttpVersion) => {
                Self::UnsupportedHttpVersion(version)
            }
            WsError::Protocol(ProtocolError::MissingConnectionUpgradeHeader) => {
                Self::MissingConnectionUpgrade
            }
            WsError::Protocol(ProtocolError::MissingUpgradeWebSocketHeader) => {
                Self::MissingUpgradeWebsocket
            }
            WsError::Protocol(ProtocolError::MissingSecWebSocketVersionHeader) => {
                Self::UnsupportedVersion
            }
            WsError::Protocol(ProtocolError::MissingSecWebSocketKey) => Self::MissingKey,
            other => Self::Invalid(other.to_string()),
        }
    }
}

/// Validates an opening handshake and returns the `101` response to send.
///
/// Only the request head is looked at; the body type is irrelevant.
///
/// # Errors
///
/// Returns the first [`HandshakeError`] the request trips over, checked in
/// the order: method, HTTP version, `Connection`, `Upgrade`,
/// `Sec-WebSocket-Version`, `Sec-WebSocket-Key`.
///
/// # Example
///
/// ```rust
/// use echo_server::application::upgrade_response;
/// use hyper::{Request, StatusCode};
///
/// let request = Request::get("/ws")
///     .header("connection", "Upgrade")
///     .header("upgrade", "websocket")
///     .header("sec-websocket-version", "13")
///     .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
///     .body(())
///     .unwrap();
///
/// let response = upgrade_response(&request).unwrap();
/// assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
/// assert_eq!(response.headers()["sec-websocket-accept"], "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn upgrade_response<B>(req: &Request<B>) -> Result<Response<()>, HandshakeError> {
    let mut head = Request::new(());
    *head.method_mut() = req.method().clone();
    *head.uri_mut() = req.uri().clone();
    *head.version_mut() = req.version();
    *head.headers_mut() = req.headers().clone();

    let response = create_response(&head)
        .map_err(|e| HandshakeError::from_ws(e, req.method(), req.version()))?;

    // tungstenite only checks that the key is present.
    let key_is_blank = req
        .headers()
        .get(SEC_WEBSOCKET_KEY)
        .is_some_and(|key| key.as_bytes().iter().all(u8::is_ascii_whitespace));
    if key_is_blank {
        return Err(HandshakeError::MissingKey);
    }

    Ok(response)
}
