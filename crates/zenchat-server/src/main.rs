//! ZenChat relay server binary.
//!
//! # Usage
//!
//! ```bash
//! # Listen on 0.0.0.0:8080
//! zenchat-server
//!
//! # Port from the environment, verbose logging
//! PORT=9000 zenchat-server --log-level debug
//! ```

use clap::Parser;
use zenchat_server::{DriverConfig, Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// ZenChat room relay
#[derive(Parser, Debug)]
#[command(name = "zenchat-server")]
#[command(about = "Real-time room relay over WebSocket")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Interface to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Do not notify the old room when a member joins a different room
    #[arg(long)]
    silent_room_switch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let bind_address = format!("{}:{}", args.host, args.port);
    tracing::info!("ZenChat server starting");
    tracing::info!("Binding to {}", bind_address);

    if args.silent_room_switch {
        tracing::info!("Room switches will not be announced to the old room");
    }

    let config = ServerRuntimeConfig {
        bind_address,
        driver: DriverConfig {
            announce_room_switch: !args.silent_room_switch,
            ..Default::default()
        },
    };

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
