//! HTTP rendering of a health report.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

use crate::health::checks::{HealthChecks, HealthRecord, HealthStatus};

type Predicate = Arc<dyn Fn(&HealthRecord) -> bool + Send + Sync>;

/// A health endpoint: which records it evaluates.
#[derive(Clone)]
pub struct HealthProbe {
    label: String,
    predicate: Predicate,
}

impl HealthProbe {
    /// Evaluates only the record called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let wanted = name.clone();
        Self {
            label: name,
            predicate: Arc::new(move |record| record.name == wanted),
        }
    }

    /// Evaluates records carrying `tag`.
    pub fn tagged(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let wanted = tag.clone();
        Self {
            label: format!("tag:{tag}"),
            predicate: Arc::new(move |record| record.tags.iter().any(|t| *t == wanted)),
        }
    }

    pub async fn respond(&self, checks: &HealthChecks) -> Response {
        let report = checks.report(|record| (self.predicate)(record)).await;
        let status = match report.status {
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
            HealthStatus::Degraded | HealthStatus::Healthy => StatusCode::OK,
        };

        (
            status,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
                (header::CACHE_CONTROL, HeaderValue::from_static("no-store, no-cache")),
            ],
            json!({ "status": report.status.to_string() }).to_string(),
        )
            .into_response()
    }
}

impl fmt::Debug for HealthProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
