//! Configuration schema definitions.
//!
//! This module defines the complete configuration bundle for the API.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root configuration for the public API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Hosting environment (controls developer error detail).
    pub environment: Environment,

    /// Listener configuration (bind address, HTTPS redirect).
    pub listener: ListenerConfig,

    /// Persistence context selection.
    pub database: DatabaseConfig,

    /// Base URLs of the API and of the web front-end.
    pub base_urls: BaseUrlConfig,

    /// Additional CORS settings on top of the web base origin.
    pub cors: CorsConfig,

    /// Identity and token settings.
    pub identity: IdentityConfig,

    /// In-memory cache settings.
    pub cache: CacheConfig,

    /// API documentation settings.
    pub documentation: DocumentationConfig,

    /// Health probe settings.
    pub health: HealthConfig,

    /// Telemetry settings.
    pub telemetry: TelemetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Startup data seeding.
    pub seeding: SeedingConfig,
}

/// Hosting environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum Environment {
    Development,
    Staging,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "Development",
            Environment::Staging => "Staging",
            Environment::Production => "Production",
        };
        f.write_str(name)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5099").
    pub bind_address: String,

    /// HTTPS port that insecure requests are redirected to.
    /// No redirect happens when unset.
    pub https_port: Option<u16>,

    /// Honour `X-Forwarded-Proto` from a TLS-terminating proxy.
    /// Only enable when every request arrives through that proxy.
    pub trust_forwarded_proto: bool,

    /// Maximum request body size read by the dispatcher.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5099".to_string(),
            https_port: None,
            trust_forwarded_proto: false,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Persistence context configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Use the in-process stores. This is the only provider compiled in.
    pub use_only_in_memory: bool,

    /// Connection string of the catalog store.
    pub catalog_connection: Option<String>,

    /// Connection string of the identity store.
    pub identity_connection: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            use_only_in_memory: true,
            catalog_connection: None,
            identity_connection: None,
        }
    }
}

/// Base URL configuration (required section when loading from a file).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BaseUrlConfig {
    /// Public base URL of this API.
    pub api_base: String,

    /// Base URL of the web front-end; its origin is allowed by CORS.
    pub web_base: String,

    /// Base URL prepended to catalog picture paths.
    pub catalog_base: String,
}

impl Default for BaseUrlConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5099/api/".to_string(),
            web_base: "http://localhost:44315/".to_string(),
            catalog_base: "http://localhost:44315".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed in addition to the web base.
    pub extra_origins: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,

    /// Send `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            extra_origins: Vec::new(),
            max_age_secs: 600,
            allow_credentials: false,
        }
    }
}

/// Identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// HMAC key used to sign and validate bearer tokens.
    pub jwt_secret: String,

    /// Token lifetime in hours.
    pub token_lifetime_hours: u64,

    /// Role granted administrative access to catalog writes.
    pub admin_role: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            jwt_secret: "SecretKeyOfDoomThatMustBeAMinimumNumberOfBytes".to_string(),
            token_lifetime_hours: 24 * 7,
            admin_role: "Administrators".to_string(),
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Absolute expiry of cached entries in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 30 }
    }
}

/// API documentation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentationConfig {
    /// Serve the generated OpenAPI document.
    pub enabled: bool,

    /// Path of the OpenAPI JSON document.
    pub path: String,

    /// Document title.
    pub title: String,

    /// Document version.
    pub version: String,
}

impl Default for DocumentationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/swagger/v1/swagger.json".to_string(),
            title: "PublicApi".to_string(),
            version: "v1".to_string(),
        }
    }
}

/// Health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Path of the public health probe.
    pub path: String,

    /// Name of the self-check exposed on the probe.
    pub self_check: String,

    /// Timeout for a single health check in seconds.
    pub check_timeout_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path: "/api/health".to_string(),
            self_check: "selfapi".to_string(),
            check_timeout_secs: 5,
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Seq ingestion endpoint.
    pub seq_server_url: String,

    /// Service name attached to telemetry.
    pub service_name: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            seq_server_url: "http://localhost:5341".to_string(),
            service_name: "public-api".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Upper bound for effectful startup steps (seeding) in seconds.
    pub startup_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            startup_secs: 60,
        }
    }
}

/// Data seeding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedingConfig {
    /// Seed reference data at startup.
    pub enabled: bool,

    /// Maximum retries on transient store errors.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Password given to the seeded demo and admin users.
    pub default_password: String,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 10,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            default_password: "Pass@word1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("Development".parse::<Environment>(), Ok(Environment::Development));
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Production));
        assert!("qa".parse::<Environment>().is_err());
        assert!(!Environment::default().is_development());
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            environment = "Development"

            [base_urls]
            web_base = "https://shop.example.com/"
            "#,
        )
        .unwrap();

        assert!(config.environment.is_development());
        assert_eq!(config.base_urls.web_base, "https://shop.example.com/");
        assert_eq!(config.telemetry.seq_server_url, "http://localhost:5341");
        assert_eq!(config.health.path, "/api/health");
    }
}
