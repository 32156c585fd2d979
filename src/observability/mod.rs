//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty in Development, JSON otherwise)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//!     → Seq endpoint named by telemetry.rs
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every log line of a request
//! - Metrics are cheap; without an installed recorder they are no-ops

pub mod logging;
pub mod metrics;
pub mod telemetry;

pub use logging::init_logging;
pub use telemetry::TelemetrySettings;
