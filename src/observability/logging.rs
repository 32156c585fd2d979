//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Pick the output format from the environment
//!
//! # Design Decisions
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the default filter

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::Environment;

const DEFAULT_FILTER: &str = "public_api=info,tower_http=info";
const DEVELOPMENT_FILTER: &str = "public_api=debug,tower_http=debug";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(environment: Environment) -> Result<(), TryInitError> {
    let default = if environment.is_development() {
        DEVELOPMENT_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let format: Box<dyn Layer<Registry> + Send + Sync> = if environment.is_development() {
        tracing_subscriber::fmt::layer().pretty().boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .try_init()
}
