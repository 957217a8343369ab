//! Listener binding and the background server task.
//!
//! [`spawn_server`] binds the socket on the calling thread, so a bad or
//! occupied address fails before anything is spawned. The returned handle
//! resolves to the serve loop's outcome.

use std::net::{SocketAddr, TcpListener as StdListener};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::router::build_router;
use crate::state::AppState;

/// Network binding for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address, e.g. `0.0.0.0`.
    pub host: String,
    /// TCP port; `0` picks an ephemeral one.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// The configured host and port as a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::InvalidAddress`] if the pair does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|source| StartupError::InvalidAddress { address, source })
    }
}

/// Errors raised while binding or running the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Host and port do not form a socket address.
    #[error("invalid server address {address}: {source}")]
    InvalidAddress {
        /// The rejected `host:port` string.
        address: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },

    /// The socket could not be bound or handed to the runtime.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The serve loop stopped with an I/O error.
    #[error("server stopped: {source}")]
    Serve {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// A bound listener and the address it actually holds.
fn bind(config: &ServerConfig) -> Result<(TcpListener, SocketAddr), StartupError> {
    let addr = config.socket_addr()?;
    let to_bind_error = |source| StartupError::Bind { addr, source };

    let std_listener = StdListener::bind(addr).map_err(to_bind_error)?;
    std_listener.set_nonblocking(true).map_err(to_bind_error)?;
    let local = std_listener.local_addr().map_err(to_bind_error)?;
    let listener = TcpListener::from_std(std_listener).map_err(to_bind_error)?;
    Ok((listener, local))
}

/// Bind the configured address and serve on a background Tokio task.
///
/// Must be called from within a Tokio runtime. Returns the task handle and
/// the bound address, which differs from the configured one when port `0`
/// was requested.
///
/// # Errors
///
/// Returns [`StartupError::InvalidAddress`] or [`StartupError::Bind`] when
/// the listener cannot be set up. Serve failures surface through the
/// handle instead.
pub fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<(JoinHandle<Result<(), StartupError>>, SocketAddr), StartupError> {
    let (listener, addr) = bind(config)?;
    let router = build_router(state);

    let handle = tokio::spawn(async move {
        info!(%addr, "Furrow server listening");
        let outcome = axum::serve(listener, router).await;
        if let Err(e) = &outcome {
            error!(%addr, error = %e, "Server exited with error");
        }
        outcome.map_err(StartupError::from)
    });

    Ok((handle, addr))
}
