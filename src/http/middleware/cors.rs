//! CORS enforcement stage.

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::http::error::{ApiError, Problem};
use crate::http::pipeline::{Next, Stage};
use crate::http::request::{is_preflight, preflight_method, request_id};
use crate::security::cors::{CorsDecision, CorsPolicy};

pub struct CorsStage {
    policy: Arc<CorsPolicy>,
}

impl CorsStage {
    pub fn new(policy: Arc<CorsPolicy>) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Stage for CorsStage {
    fn name(&self) -> &'static str {
        "cors"
    }

    async fn handle(&self, req: Request, next: Next<'_>) -> Result<Response, ApiError> {
        match self.policy.evaluate(req.headers()) {
            CorsDecision::NotCors => next.run(req).await,
            CorsDecision::Rejected(origin) => {
                tracing::warn!(origin = %origin, path = %req.uri().path(), "CORS origin rejected");
                Ok(Problem::new(
                    StatusCode::FORBIDDEN,
                    "cors_origin_rejected",
                    format!("Origin {origin} is not allowed"),
                )
                .with_request_id(request_id(req.headers()))
                .into_response())
            }
            CorsDecision::Allowed(origin) if is_preflight(&req) => {
                let method = preflight_method(&req).unwrap_or_else(|| req.method().clone());
                Ok(self.policy.preflight(&origin, req.headers(), &method))
            }
            CorsDecision::Allowed(origin) => {
                let mut response = next.run(req).await?;
                self.policy.apply(&origin, response.headers_mut());
                Ok(response)
            }
        }
    }
}
