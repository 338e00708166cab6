//! HTTP server: accept loop and per-connection HTTP/1 service.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections.
//! 3. Serving each connection with hyper's HTTP/1 server in its own task.
//! 4. Routing each request: `/ws` to the WebSocket upgrade, everything else to
//!    the status page.
//! 5. Handing a successfully upgraded connection to its own echo task.
//!
//! # Scalability
//!
//! The accept loop never does I/O on a connection itself: it accepts and
//! immediately spawns a task for it, so one slow peer never delays another.
//! Each upgraded connection gets one more task that owns the WebSocket stream.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, SEC_WEBSOCKET_VERSION};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{tungstenite::protocol::Role, WebSocketStream};
use tracing::{debug, error, info, warn};

use echo_core::ConnectionStats;

use crate::application::{status_body, upgrade_response, HandshakeError, WEBSOCKET_VERSION};
use crate::domain::{Route, ServerConfig};
use crate::infrastructure::echo_session::{echo_socket_config, run_echo_session};

type HttpResponse = Response<Full<Bytes>>;

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the configured address and serves connections forever.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port is
/// already in use or the process lacks permission to bind).  This is the only
/// failure the server reports; everything after startup is per-connection.
pub async fn run_server(config: ServerConfig, stats: Arc<ConnectionStats>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", config.bind_addr))?;

    info!("Listening on port {}", config.bind_addr.port());

    serve(listener, stats).await;
    Ok(())
}

/// Accepts connections from an already-bound listener, forever.
///
/// Split out from [`run_server`] so tests can bind `127.0.0.1:0` and learn
/// the real port before serving.
pub async fn serve(listener: TcpListener, stats: Arc<ConnectionStats>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                debug!("new connection from {peer_addr}");
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, stats).await;
                });
            }
            Err(e) => {
                // Transient accept error (e.g., too many open file descriptors).
                error!("accept error: {e}");
            }
        }
    }
}

// ── Per-connection handler ────────────────────────────────────────────────────

/// Serves HTTP/1 requests on one TCP connection until it closes or upgrades.
async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, stats: Arc<ConnectionStats>) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req| route_request(req, peer_addr, Arc::clone(&stats)));

    let conn = http1::Builder::new()
        .serve_connection(io, service)
        .with_upgrades();

    if let Err(e) = conn.await {
        // A peer hanging up between requests is not worth reporting.
        if !e.is_incomplete_message() {
            debug!("connection {peer_addr} ended with error: {e}");
        }
    }
}

async fn route_request(
    mut req: Request<Incoming>,
    peer_addr: SocketAddr,
    stats: Arc<ConnectionStats>,
) -> Result<HttpResponse, Infallible> {
    debug!("{peer_addr}: {} {}", req.method(), req.uri());

    let response = match Route::from_path(req.uri().path()) {
        Route::Echo => upgrade_to_echo(&mut req, peer_addr, stats),
        Route::Status => status_response(&stats),
    };

    Ok(response)
}

// ── Status page ───────────────────────────────────────────────────────────────

/// `200 OK` with `{"max":..,"active":..}`.  No `Content-Type` is set.
fn status_response(stats: &ConnectionStats) -> HttpResponse {
    match status_body(stats) {
        Ok(body) => Response::new(Full::new(Bytes::from(body))),
        Err(e) => {
            error!("failed to render status: {e}");
            text_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// ── WebSocket upgrade ─────────────────────────────────────────────────────────

/// Answers `101 Switching Protocols` and spawns the echo task that takes over
/// the connection once hyper releases it.
fn upgrade_to_echo(
    req: &mut Request<Incoming>,
    peer_addr: SocketAddr,
    stats: Arc<ConnectionStats>,
) -> HttpResponse {
    let switching = match upgrade_response(req) {
        Ok(response) => response,
        Err(e) => {
            warn!("{peer_addr}: rejected WebSocket upgrade: {e}");
            return rejection_response(&e);
        }
    };

    // Resolves after hyper has written the 101 below and let go of the socket.
    let on_upgrade = hyper::upgrade::on(req);

    tokio::spawn(async move {
        match on_upgrade.await {
            Ok(upgraded) => {
                let ws = WebSocketStream::from_raw_socket(
                    TokioIo::new(upgraded),
                    Role::Server,
                    Some(echo_socket_config()),
                )
                .await;
                run_echo_session(ws, peer_addr, stats).await;
            }
            Err(e) => warn!("{peer_addr}: WebSocket upgrade failed: {e}"),
        }
    });

    switching.map(|()| Full::default())
}

fn rejection_response(err: &HandshakeError) -> HttpResponse {
    let mut response = text_response(err.status());
    if matches!(err, HandshakeError::UnsupportedVersion) {
        // RFC 6455 §4.4: tell the client which version we do speak.
        response.headers_mut().insert(
            SEC_WEBSOCKET_VERSION,
            HeaderValue::from_static(WEBSOCKET_VERSION),
        );
    }
    response
}

/// A response whose body is the status code's reason phrase.
fn text_response(status: StatusCode) -> HttpResponse {
    let reason = status.canonical_reason().unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from_static(reason.as_bytes())));
    *response.status_mut() = status;
    response
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_status_response_is_200_with_json_body() {
        // Arrange
        let stats = ConnectionStats::new();

        // Act
        let response = status_response(&stats);

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("content-type").is_none());
        assert_eq!(body_string(response).await, r#"{"max":0,"active":0}"#);
    }

    #[tokio::test]
    async fn test_status_response_reflects_open_sessions() {
        let stats = Arc::new(ConnectionStats::new());
        let _a = stats.open();
        let _b = stats.open();

        let response = status_response(&stats);

        assert_eq!(body_string(response).await, r#"{"max":2,"active":2}"#);
    }

    #[test]
    fn test_version_rejection_advertises_supported_version() {
        let response = rejection_response(&HandshakeError::UnsupportedVersion);
        assert_eq!(response.status(), StatusCode::UPGRADE_REQUIRED);
        assert_eq!(response.headers()[SEC_WEBSOCKET_VERSION], "13");
    }

    #[tokio::test]
    async fn test_bad_request_rejection_has_reason_body() {
        let response = rejection_response(&HandshakeError::MissingKey);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(SEC_WEBSOCKET_VERSION).is_none());
        assert_eq!(body_string(response).await, "Bad Request");
    }
}
