//! Authorization stage.
//!
//! # Responsibilities
//! - Evaluate the matched route's policy
//! - Authenticate the caller only when the policy needs a principal
//! - Hand the principal to dispatch as a request extension
//!
//! # Design Decisions
//! - 401 with a `WWW-Authenticate` challenge when credentials are missing
//!   or invalid; 403 when a valid principal lacks the role

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::http::error::{ApiError, Problem};
use crate::http::middleware::routing::MatchedRoute;
use crate::http::pipeline::{Next, Stage};
use crate::http::request::request_id;
use crate::identity::{AuthFailure, Authenticator};

pub struct AuthorizationStage {
    authenticator: Arc<dyn Authenticator>,
}

impl AuthorizationStage {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }

    fn challenge(&self, failure: &AuthFailure, request_id: Option<String>) -> Response {
        let challenge = match failure {
            AuthFailure::MissingCredentials => self.authenticator.scheme().to_string(),
            AuthFailure::InvalidToken(_) => format!("{} error=\"invalid_token\"", self.authenticator.scheme()),
        };
        let mut response = Problem::new(StatusCode::UNAUTHORIZED, "unauthorized", failure.to_string())
            .with_request_id(request_id)
            .into_response();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

#[async_trait]
impl Stage for AuthorizationStage {
    fn name(&self) -> &'static str {
        "authorization"
    }

    async fn handle(&self, mut req: Request, next: Next<'_>) -> Result<Response, ApiError> {
        let matched = req
            .extensions()
            .get::<MatchedRoute>()
            .cloned()
            .ok_or_else(|| ApiError::internal("authorization ran before routing"))?;
        let policy = &matched.route.policy;
        if !policy.requires_authentication() {
            return next.run(req).await;
        }

        let principal = match self.authenticator.authenticate(req.headers()).await {
            Ok(principal) => principal,
            Err(failure) => {
                tracing::debug!(route = %matched.route.name, reason = %failure, "Authentication failed");
                return Ok(self.challenge(&failure, request_id(req.headers())));
            }
        };

        if !policy.permits(&principal) {
            tracing::info!(route = %matched.route.name, user = %principal.name, "Access denied");
            return Ok(Problem::new(
                StatusCode::FORBIDDEN,
                "forbidden",
                format!("{} may not access {}", principal.name, matched.route.name),
            )
            .with_request_id(request_id(req.headers()))
            .into_response());
        }

        req.extensions_mut().insert(principal);
        next.run(req).await
    }
}
