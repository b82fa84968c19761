//! ZenChat relay server.
//!
//! Production runtime for the room relay: WebSocket transport over Tokio,
//! system time and OS randomness.
//!
//! # Architecture
//!
//! The [`ServerDriver`] is pure logic: it consumes [`ServerEvent`]s and
//! returns [`ServerAction`]s. The [`Hub`] owns the driver behind a single
//! lock, and [`serve_connection`] runs one task per connection that turns
//! socket activity into events. Broadcasts are pushed into per-connection
//! outboxes by the [`Broadcaster`] while the driver lock is held, which keeps
//! delivery order identical to dispatch order for every recipient.
//!
//! # Components
//!
//! - [`ServerDriver`]: event router and lifecycle manager (no I/O)
//! - [`ConnectionRegistry`]: sessions and derived room membership
//! - [`Broadcaster`]: fan-out with per-recipient failure isolation
//! - [`Server`]: accept loop
//! - [`WsTransport`]: TCP listener
//! - [`SystemEnv`]: production environment (real time, OS RNG)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod broadcaster;
mod driver;
mod error;
mod icons;
mod registry;
mod server_error;
mod system_env;
mod transport;

use std::{net::SocketAddr, sync::Arc, time::Duration};

pub use broadcaster::{Broadcaster, DeliveryReport, Outbox};
pub use driver::{DriverConfig, LogLevel, ServerAction, ServerDriver, ServerEvent};
pub use error::ServerError;
use futures::{SinkExt, StreamExt, stream::SplitSink};
pub use icons::{DEFAULT_ICONS, IconSet};
pub use registry::{ConnectionRegistry, Session};
pub use server_error::DriverError;
pub use system_env::SystemEnv;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::{Mutex, mpsc},
};
use tokio_tungstenite::{WebSocketStream, tungstenite::Message};
pub use transport::WsTransport;
use zenchat_core::Environment;

/// How long a closing connection may take to flush its final frames.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080")
    pub bind_address: String,
    /// Driver configuration
    pub driver: DriverConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:8080".to_string(), driver: DriverConfig::default() }
    }
}

/// Shared relay state: the driver behind one lock plus the outboxes.
///
/// Cheap to clone; every connection task holds one.
#[derive(Clone)]
pub struct Hub<E: Environment = SystemEnv> {
    driver: Arc<Mutex<ServerDriver<E>>>,
    broadcaster: Arc<Broadcaster>,
    env: E,
}

impl<E: Environment> Hub<E> {
    /// Create a hub around a fresh driver.
    pub fn new(env: E, config: DriverConfig) -> Self {
        let driver = ServerDriver::new(env.clone(), config);
        Self {
            driver: Arc::new(Mutex::new(driver)),
            broadcaster: Arc::new(Broadcaster::new()),
            env,
        }
    }

    /// Process one event and execute the resulting actions.
    ///
    /// # Errors
    ///
    /// Propagates [`DriverError`]; actions are not executed in that case.
    pub async fn dispatch(&self, event: ServerEvent) -> Result<(), DriverError> {
        let mut driver = self.driver.lock().await;
        let actions = driver.process_event(event)?;
        // Delivery only enqueues, so holding the lock here is cheap and
        // keeps per-recipient order equal to dispatch order.
        execute_actions(actions, &self.broadcaster).await;
        Ok(())
    }

    /// Outbox registry.
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Connection IDs in a room, in join order.
    pub async fn members_of(&self, room: &str) -> Vec<u64> {
        self.driver.lock().await.members_of(room)
    }

    /// Number of live connections known to the driver.
    pub async fn connection_count(&self) -> usize {
        self.driver.lock().await.connection_count()
    }
}

impl<E: Environment> std::fmt::Debug for Hub<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub").finish_non_exhaustive()
    }
}

/// Production ZenChat server.
///
/// Wraps the [`Hub`] with a TCP listener and the system environment.
#[derive(Debug)]
pub struct Server {
    /// Shared relay state
    hub: Hub<SystemEnv>,
    /// TCP listener
    transport: WsTransport,
}

impl Server {
    /// Create and bind a new server.
    ///
    /// # Errors
    ///
    /// - `ServerError::Config` if the bind address is invalid
    /// - `ServerError::Transport` if the port cannot be bound
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        let hub = Hub::new(SystemEnv::new(), config.driver);
        let transport = WsTransport::bind(&config.bind_address).await?;
        Ok(Self { hub, transport })
    }

    /// Run the accept loop. Never returns under normal operation.
    ///
    /// Accept failures are logged and the loop continues.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server starting on {}", self.transport.local_addr()?);

        loop {
            match self.transport.accept().await {
                Ok((stream, peer)) => {
                    let hub = self.hub.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, peer, hub).await {
                            tracing::debug!(%peer, "Connection error: {}", e);
                        }
                    });
                },
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                },
            }
        }
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.transport.local_addr()
    }
}

/// Serve a single connection from TCP accept to close.
///
/// Performs the WebSocket handshake, attaches the connection's outbox, feeds
/// every text frame to the driver and reports the close. Error close and
/// normal close are handled identically: the driver always sees exactly one
/// `ConnectionClosed`.
///
/// # Errors
///
/// - `ServerError::Driver` if the hub rejects the connection ID
/// - `ServerError::Protocol` if the WebSocket handshake fails
pub async fn serve_connection<S, E>(
    stream: S,
    peer: SocketAddr,
    hub: Hub<E>,
) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    E: Environment,
{
    let session_id = hub.env.random_u64();
    hub.dispatch(ServerEvent::ConnectionAccepted { session_id }).await?;
    tracing::debug!(session_id, %peer, "New connection");

    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            report_closed(&hub, session_id, format!("handshake failed: {e}")).await;
            return Err(e.into());
        },
    };

    let (sink, mut source) = ws.split();
    let (outbox, inbox) = mpsc::unbounded_channel();
    hub.broadcaster.attach(session_id, outbox).await;
    let mut writer = tokio::spawn(write_frames(session_id, sink, inbox));

    if let Err(e) = hub.dispatch(ServerEvent::ConnectionOpened { session_id }).await {
        hub.broadcaster.detach(session_id).await;
        writer.abort();
        report_closed(&hub, session_id, format!("open rejected: {e}")).await;
        return Err(e.into());
    }
    tracing::info!(session_id, %peer, "Connection open");

    let reason = loop {
        match source.next().await {
            Some(Ok(Message::Text(text))) => {
                let event = ServerEvent::TextReceived { session_id, text: text.as_str().to_owned() };
                if let Err(e) = hub.dispatch(event).await {
                    tracing::warn!(session_id, error = %e, "Failed to dispatch frame");
                }
            },
            Some(Ok(Message::Binary(data))) => {
                tracing::debug!(session_id, len = data.len(), "Dropping binary frame");
            },
            Some(Ok(Message::Close(_))) => break "closed by peer".to_string(),
            // Ping/pong are answered by tungstenite on the next read or write.
            Some(Ok(_)) => {},
            Some(Err(e)) => break format!("transport error: {e}"),
            None => break "stream ended".to_string(),
        }
    };

    // Dropping the outbox ends the writer, which completes the close handshake.
    hub.broadcaster.detach(session_id).await;
    tracing::info!(session_id, %peer, %reason, "Connection closed");
    report_closed(&hub, session_id, reason).await;

    match tokio::time::timeout(CLOSE_TIMEOUT, &mut writer).await {
        Ok(Err(e)) => tracing::debug!(session_id, error = %e, "Writer task failed"),
        Ok(Ok(())) => {},
        Err(_) => {
            tracing::debug!(session_id, "Writer did not finish closing, aborting");
            writer.abort();
        },
    }

    Ok(())
}

async fn report_closed<E: Environment>(hub: &Hub<E>, session_id: u64, reason: String) {
    if let Err(e) = hub.dispatch(ServerEvent::ConnectionClosed { session_id, reason }).await {
        tracing::error!(session_id, error = %e, "Failed to process close");
    }
}

/// Drain an outbox into the socket until either side goes away.
async fn write_frames<S>(
    session_id: u64,
    mut sink: SplitSink<WebSocketStream<S>, Message>,
    mut inbox: mpsc::UnboundedReceiver<Arc<str>>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(frame) = inbox.recv().await {
        if let Err(e) = sink.send(Message::text(frame.to_string())).await {
            tracing::debug!(session_id, error = %e, "Writer stopped");
            return;
        }
    }
    if let Err(e) = sink.close().await {
        tracing::debug!(session_id, error = %e, "Close handshake failed");
    }
}

/// Execute driver actions.
async fn execute_actions(actions: Vec<ServerAction>, broadcaster: &Broadcaster) {
    for action in actions {
        match action {
            ServerAction::Broadcast { recipients, message } => {
                broadcaster.deliver(&message, &recipients).await;
            },
            ServerAction::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            },
        }
    }
}
