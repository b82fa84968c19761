//! TCP listener for WebSocket connections.
//!
//! Accepts raw TCP streams. The WebSocket handshake happens per connection
//! in the runtime so that a slow handshake never blocks the accept loop.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};

use crate::error::ServerError;

/// Listening socket for inbound WebSocket connections.
#[derive(Debug)]
pub struct WsTransport {
    listener: TcpListener,
}

impl WsTransport {
    /// Bind to `address` (e.g. `0.0.0.0:8080`).
    ///
    /// # Errors
    ///
    /// - `ServerError::Config` if the address does not parse
    /// - `ServerError::Transport` if the socket cannot be bound
    pub async fn bind(address: &str) -> Result<Self, ServerError> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid bind address '{address}': {e}")))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Transport(format!("failed to bind {addr}: {e}")))?;

        Ok(Self { listener })
    }

    /// Accept the next TCP connection.
    ///
    /// # Errors
    ///
    /// - `ServerError::Transport` if accepting fails
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ServerError> {
        let (stream, peer) = self.listener.accept().await?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "failed to set TCP_NODELAY");
        }
        Ok((stream, peer))
    }

    /// Local address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }
}
