//! eShop public API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Bootstrap (once, in order)
//!     ┌──────────────────────────────────────────────────────────────┐
//!     │ configuration → persistence → identity → domain services     │
//!     │ → caching → authentication → cors → routing → documentation  │
//!     │ → health → telemetry → [build] → seeding → middleware        │
//!     └──────────────────────────────┬───────────────────────────────┘
//!                                    ▼
//!     Client ──▶ axum (timeout, request id, trace) ──▶ Pipeline
//!                ┌────────────────────────────────────────────────┐
//!                │ exception → https → routing → cors →            │
//!                │ authorization → dispatch (endpoints | health)   │
//!                └────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use public_api::config::{ConfigSource, Environment};
use public_api::lifecycle::signals::spawn_signal_handler;
use public_api::lifecycle::{Bootstrap, Shutdown};
use public_api::observability::init_logging;

#[derive(Debug, Parser)]
#[command(name = "public-api")]
#[command(about = "eShop public catalog and authentication API", long_about = None)]
struct Cli {
    /// Base configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overlay merged over the base configuration when present.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Hosting environment, overriding the configuration.
    #[arg(short, long)]
    environment: Option<Environment>,

    /// Listener address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ConfigSource::files(cli.config, cli.overlay).load()?;
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(config.environment)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "public-api starting"
    );

    let bind_address = config.listener.bind_address.clone();
    let app = Bootstrap::standard(ConfigSource::Inline(config)).run().await?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());
    app.serve(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
