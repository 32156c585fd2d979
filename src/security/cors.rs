//! Cross-origin resource sharing policy.
//!
//! # Responsibilities
//! - Derive the allowed origin set from the web front-end base URL
//! - Decide whether a request's `Origin` is allowed
//! - Produce preflight answers and the headers for allowed requests
//!
//! # Design Decisions
//! - Any method and any header are allowed for an allowed origin
//! - Origins compare case-insensitively, without a trailing slash
//! - `Vary: Origin` on every CORS answer so caches keep origins apart

use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use std::collections::BTreeSet;

use crate::config::{BaseUrlConfig, CorsConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    origins: BTreeSet<String>,
    max_age_secs: u64,
    allow_credentials: bool,
}

/// Outcome of checking a request's `Origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsDecision {
    /// No `Origin` header; CORS does not apply.
    NotCors,
    Allowed(HeaderValue),
    Rejected(String),
}

/// Origin form of a base URL: docker host alias mapped to localhost, no
/// trailing slash, lower case.
pub fn normalize_origin(url: &str) -> String {
    url.replace("host.docker.internal", "localhost")
        .trim_end_matches('/')
        .to_ascii_lowercase()
}

impl CorsPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            origins: origins
                .into_iter()
                .map(|origin| normalize_origin(origin.as_ref()))
                .collect(),
            max_age_secs: CorsConfig::default().max_age_secs,
            allow_credentials: false,
        }
    }

    pub fn from_config(base_urls: &BaseUrlConfig, cors: &CorsConfig) -> Self {
        let origins = std::iter::once(base_urls.web_base.as_str())
            .chain(cors.extra_origins.iter().map(String::as_str));
        Self {
            max_age_secs: cors.max_age_secs,
            allow_credentials: cors.allow_credentials,
            ..Self::new(origins)
        }
    }

    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.contains(&normalize_origin(origin))
    }

    pub fn evaluate(&self, headers: &HeaderMap) -> CorsDecision {
        let Some(value) = headers.get(header::ORIGIN) else {
            return CorsDecision::NotCors;
        };
        match value.to_str() {
            Ok(origin) if self.is_allowed(origin) => CorsDecision::Allowed(value.clone()),
            Ok(origin) => CorsDecision::Rejected(origin.to_string()),
            Err(_) => CorsDecision::Rejected("<non-ascii origin>".to_string()),
        }
    }

    /// Headers added to an allowed, non-preflight response.
    pub fn apply(&self, origin: &HeaderValue, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
    }

    /// `204` answer to a preflight from an allowed origin.
    pub fn preflight(&self, origin: &HeaderValue, request: &HeaderMap, method: &Method) -> Response {
        let mut headers = HeaderMap::new();
        self.apply(origin, &mut headers);

        if let Ok(value) = HeaderValue::from_str(method.as_str()) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
        }
        if let Some(requested) = request.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        }
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.max_age_secs));

        (StatusCode::NO_CONTENT, headers).into_response()
    }
}
