//! Production connection handling over turmoil's simulated network.
//!
//! Runs the real [`serve_connection`] path (WebSocket handshake, outboxes,
//! writer tasks) on turmoil TCP streams, with [`SimEnv`] supplying time and
//! randomness. Use from inside a turmoil host:
//!
//! ```ignore
//! sim.host("server", || async {
//!     run_sim_server(8080, SimEnv::new(), DriverConfig::default()).await?;
//!     Ok(())
//! });
//! ```

use std::io;

use turmoil::net::TcpListener;
use zenchat_server::{DriverConfig, Hub, serve_connection};

use crate::SimEnv;

/// Accept simulated connections on `port` forever.
///
/// Each connection is served on its own task, as in production.
pub async fn run_sim_server(port: u16, env: SimEnv, config: DriverConfig) -> io::Result<()> {
    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(address.as_str()).await?;
    let hub = Hub::new(env, config);

    loop {
        let (stream, peer) = listener.accept().await?;
        let hub = hub.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, peer, hub).await {
                tracing::debug!(%peer, error = %e, "simulated connection failed");
            }
        });
    }
}
