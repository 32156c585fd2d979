//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! base file + overlay file (TOML) + environment
//!     → loader.rs (parse, deep-merge, override)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → registered once as a capability, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigSource};
pub use schema::{
    AppConfig, BaseUrlConfig, CacheConfig, CorsConfig, DatabaseConfig, DocumentationConfig,
    Environment, HealthConfig, IdentityConfig, ListenerConfig, SeedingConfig, TelemetryConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
