//! Dispatch stage: the innermost stage.

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::endpoints::EndpointContext;
use crate::health::HealthChecks;
use crate::http::error::{ApiError, Problem};
use crate::http::middleware::routing::MatchedRoute;
use crate::http::pipeline::{Next, Stage};
use crate::http::request::request_id;
use crate::identity::Principal;
use crate::lifecycle::registry::CapabilityRegistry;
use crate::routing::RouteTarget;

pub struct DispatchStage {
    registry: Arc<CapabilityRegistry>,
    max_body_bytes: usize,
}

impl DispatchStage {
    pub fn new(registry: Arc<CapabilityRegistry>, max_body_bytes: usize) -> Self {
        Self {
            registry,
            max_body_bytes,
        }
    }

    fn too_large(&self, request_id: Option<String>) -> Response {
        Problem::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            format!("Request body exceeds {} bytes", self.max_body_bytes),
        )
        .with_request_id(request_id)
        .into_response()
    }
}

#[async_trait]
impl Stage for DispatchStage {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    async fn handle(&self, req: Request, _next: Next<'_>) -> Result<Response, ApiError> {
        let (mut parts, body) = req.into_parts();
        let matched = parts
            .extensions
            .remove::<MatchedRoute>()
            .ok_or_else(|| ApiError::internal("dispatch ran without a matched route"))?;

        let handler = match &matched.route.target {
            RouteTarget::Health(probe) => {
                let checks = self.registry.get::<HealthChecks>()?;
                return Ok(probe.respond(&checks).await);
            }
            RouteTarget::Handler(handler) => handler.clone(),
        };

        let declared = parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<usize>().ok());
        if declared.is_some_and(|length| length > self.max_body_bytes) {
            return Ok(self.too_large(request_id(&parts.headers)));
        }
        let body = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(error = %err, "Request body rejected");
                return Ok(self.too_large(request_id(&parts.headers)));
            }
        };

        let principal = parts.extensions.remove::<Principal>();
        let ctx = EndpointContext::new(parts, body, matched.params, principal, self.registry.clone());
        handler.call(ctx).await
    }
}
