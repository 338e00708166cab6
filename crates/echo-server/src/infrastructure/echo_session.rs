//! Per-session echo loop.
//!
//! Once hyper has switched the connection to WebSocket, the session task owns
//! the stream outright.  Its lifecycle is:
//!
//! ```text
//! Connecting ──(upgrade done)──► Echoing ──(close / error)──► Closed
//!                                  │
//!                                  └─ ConnectionStats::open() on entry,
//!                                     guard closed or dropped on every exit
//! ```
//!
//! Text frames go back as text and binary frames as binary, with payloads
//! untouched.  Control frames are left to tokio-tungstenite: a Ping is
//! answered with a Pong, and a Close is answered with a Close, on the next
//! read of the stream.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::{
    tungstenite::{protocol::WebSocketConfig, Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, info};

use echo_core::ConnectionStats;

/// Runs one echo session to completion and keeps the counters in step.
///
/// Never returns an error: an I/O or protocol failure simply ends the session.
/// The active count is decremented however the session ends, including if
/// this future is dropped mid-flight.
pub async fn run_echo_session<S>(
    mut ws: WebSocketStream<S>,
    peer_addr: SocketAddr,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let guard = stats.open();
    info!(
        "echo session {peer_addr} opened ({} active)",
        guard.opened().active
    );

    match echo_frames(&mut ws).await {
        Ok(echoed) => debug!("echo session {peer_addr}: peer closed after {echoed} frames"),
        Err(e) => debug!("echo session {peer_addr} ended with error: {e}"),
    }

    let closed = guard.close();
    info!("echo session {peer_addr} closed ({} active)", closed.active);
}

/// WebSocket settings for echo sessions.
///
/// Frame and message size limits are lifted: whatever the peer sends, however
/// large, is relayed back rather than rejected.  Both ends of a session must
/// use this, or a large echo trips the peer's own default limits.
pub fn echo_socket_config() -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_frame_size = None;
    config.max_message_size = None;
    config
}

/// Sends every data frame back to the peer until the stream ends.
///
/// Returns the number of frames echoed.  tokio-tungstenite reports a completed
/// close handshake as the end of the stream, not as an error.
async fn echo_frames<S>(ws: &mut WebSocketStream<S>) -> Result<u64, WsError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut echoed = 0u64;

    while let Some(frame) = ws.next().await {
        match frame? {
            msg @ (WsMessage::Text(_) | WsMessage::Binary(_)) => {
                ws.send(msg).await?;
                echoed += 1;
            }
            WsMessage::Close(close) => {
                // The reply is queued; the next `next()` flushes it and ends the stream.
                debug!("close frame received: {close:?}");
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    }

    Ok(echoed)
}
