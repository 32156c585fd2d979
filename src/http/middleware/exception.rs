//! Exception boundary: the outermost stage.
//!
//! # Responsibilities
//! - Catch errors and panics from every later stage
//! - Translate them into one problem response
//! - Attach debug detail in Development only
//!
//! # Design Decisions
//! - Never returns `Err`; whatever happens downstream becomes a response
//! - Internal error messages are replaced outside Development

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use std::any::Any;
use std::error::Error as _;
use std::panic::AssertUnwindSafe;

use crate::config::Environment;
use crate::http::error::{ApiError, Problem};
use crate::http::pipeline::{Next, Stage};
use crate::http::request::request_id;

pub const GENERIC_MESSAGE: &str = "An unexpected error occurred.";

pub struct ExceptionBoundary {
    environment: Environment,
}

impl ExceptionBoundary {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    fn translate(&self, err: ApiError, request_id: Option<String>) -> Response {
        if err.is_internal() {
            tracing::error!(error = %err, source = ?err.source(), request_id = ?request_id, "Unhandled error");
        } else {
            tracing::debug!(error = %err, code = err.code(), request_id = ?request_id, "Request failed");
        }

        let message = if err.is_internal() && !self.environment.is_development() {
            GENERIC_MESSAGE.to_string()
        } else {
            err.to_string()
        };
        let mut problem = Problem::new(err.status(), err.code(), message).with_request_id(request_id);
        if self.environment.is_development() {
            problem = problem.with_detail(format!("{err:?}"));
        }
        problem.into_response()
    }

    fn translate_panic(&self, payload: Box<dyn Any + Send>, request_id: Option<String>) -> Response {
        let panic_message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        tracing::error!(panic = %panic_message, request_id = ?request_id, "Request handler panicked");

        let mut problem = Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", GENERIC_MESSAGE)
            .with_request_id(request_id);
        if self.environment.is_development() {
            problem = problem.with_detail(panic_message);
        }
        problem.into_response()
    }
}

#[async_trait]
impl Stage for ExceptionBoundary {
    fn name(&self) -> &'static str {
        "exception"
    }

    async fn handle(&self, req: Request, next: Next<'_>) -> Result<Response, ApiError> {
        let request_id = request_id(req.headers());
        let response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => self.translate(err, request_id),
            Err(payload) => self.translate_panic(payload, request_id),
        };
        Ok(response)
    }
}
