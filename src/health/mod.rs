//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     HealthChecks::builder()
//!     → add(name, tags, check) per record ("selfapi", "catalog-store", ...)
//!     → registered as a capability
//!
//! GET /api/health:
//!     HealthProbe (predicate selects records)
//!     → run selected checks concurrently, each under a timeout
//!     → aggregate (worst status wins)
//!     → {"status": "..."} with 200, or 503 when Unhealthy
//! ```
//!
//! # Design Decisions
//! - A probe only evaluates the records its predicate selects
//! - An empty selection is Healthy
//! - A check that times out or panics counts as Unhealthy

pub mod checks;
pub mod probe;

pub use checks::{
    CatalogStoreCheck, HealthCheck, HealthCheckResult, HealthChecks, HealthChecksBuilder,
    HealthRecord, HealthReport, HealthStatus, IdentityStoreCheck, SelfCheck,
};
pub use probe::HealthProbe;
