//! ws-echo entry point.
//!
//! Serves a WebSocket echo endpoint and a status page on one port:
//!
//! - `GET /ws` upgrades to WebSocket; every frame the client sends comes back
//!   unchanged until either side closes.
//! - Any other path returns `{"max":<peak sessions>,"active":<open sessions>}`.
//!
//! # Usage
//!
//! ```text
//! ws-echo [OPTIONS]
//!
//! Options:
//!   --host <ADDR>   Address to bind [default: 0.0.0.0]
//!   -p, --port <PORT>   TCP port to listen on [default: 9000]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (e.g. `RUST_LOG=debug`), defaulting to
//! `info`.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use echo_core::ConnectionStats;
use echo_server::domain::{ServerConfig, DEFAULT_PORT};
use echo_server::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebSocket echo server with a connection-count status page.
#[derive(Debug, Parser)]
#[command(
    name = "ws-echo",
    about = "WebSocket echo server with a connection-count status page",
    version
)]
struct Cli {
    /// IP address to bind the listener to.
    ///
    /// Use `0.0.0.0` to accept connections on every interface, or `127.0.0.1`
    /// for local connections only.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// TCP port for both the status page and the `/ws` endpoint.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--host` is not a valid IP address.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.host))?;

        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, self.port),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Sets up logging, parses the CLI, and runs the server.
///
/// A bind failure is returned from `main`, so the process prints the error
/// chain and exits with a non-zero status.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;

    info!("ws-echo starting on {}", config.bind_addr);

    let stats = Arc::new(ConnectionStats::new());
    run_server(config, stats).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
