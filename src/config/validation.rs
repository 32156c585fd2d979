//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, key lengths, URLs)
//! - Reject providers this build cannot serve
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

/// Minimum HMAC key length for HS256 signing.
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("{field} is not a valid absolute URL: '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("identity.jwt_secret must be at least {min} bytes, got {actual}")]
    WeakSigningKey { min: usize, actual: usize },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("database.use_only_in_memory = false requires a provider this build does not include")]
    UnsupportedDatabaseProvider,

    #[error("{field} must start with '/': '{value}'")]
    InvalidPath { field: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("listener.max_body_bytes"));
    }

    check_url(&mut errors, "base_urls.api_base", &config.base_urls.api_base);
    check_url(&mut errors, "base_urls.web_base", &config.base_urls.web_base);
    check_url(&mut errors, "base_urls.catalog_base", &config.base_urls.catalog_base);
    check_url(&mut errors, "telemetry.seq_server_url", &config.telemetry.seq_server_url);
    for origin in &config.cors.extra_origins {
        check_url(&mut errors, "cors.extra_origins", origin);
    }

    if config.telemetry.metrics_enabled
        && config.telemetry.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidBindAddress(
            config.telemetry.metrics_address.clone(),
        ));
    }

    let key_len = config.identity.jwt_secret.len();
    if key_len < MIN_SIGNING_KEY_BYTES {
        errors.push(ValidationError::WeakSigningKey {
            min: MIN_SIGNING_KEY_BYTES,
            actual: key_len,
        });
    }
    if config.identity.token_lifetime_hours == 0 {
        errors.push(ValidationError::Zero("identity.token_lifetime_hours"));
    }
    if config.identity.admin_role.trim().is_empty() {
        errors.push(ValidationError::Empty("identity.admin_role"));
    }

    if !config.database.use_only_in_memory {
        errors.push(ValidationError::UnsupportedDatabaseProvider);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.timeouts.startup_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.startup_secs"));
    }
    if config.health.check_timeout_secs == 0 {
        errors.push(ValidationError::Zero("health.check_timeout_secs"));
    }

    check_path(&mut errors, "health.path", &config.health.path);
    if config.health.self_check.trim().is_empty() {
        errors.push(ValidationError::Empty("health.self_check"));
    }
    if config.documentation.enabled {
        check_path(&mut errors, "documentation.path", &config.documentation.path);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::InvalidPath {
            field,
            value: value.to_string(),
        });
    }
}
