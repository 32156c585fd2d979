//! Routing stage: resolve the route before CORS and authorization run.

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::http::error::{ApiError, Problem};
use crate::http::pipeline::{Next, Stage};
use crate::http::request::{is_preflight, preflight_method, request_id};
use crate::routing::{PathParams, RouteEntry, RouteMatch, RouteTable};

/// Request extension set by [`RoutingStage`].
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    pub route: Arc<RouteEntry>,
    pub params: PathParams,
}

pub struct RoutingStage {
    routes: Arc<RouteTable>,
}

impl RoutingStage {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }
}

#[async_trait]
impl Stage for RoutingStage {
    fn name(&self) -> &'static str {
        "routing"
    }

    async fn handle(&self, mut req: Request, next: Next<'_>) -> Result<Response, ApiError> {
        // A preflight is routed as the request it announces.
        let method = if is_preflight(&req) {
            preflight_method(&req).unwrap_or_else(|| req.method().clone())
        } else {
            req.method().clone()
        };

        match self.routes.at(&method, req.uri().path()) {
            RouteMatch::Found { route, params } => {
                tracing::debug!(route = %route.name, method = %method, "Route matched");
                req.extensions_mut().insert(MatchedRoute { route, params });
                next.run(req).await
            }
            RouteMatch::MethodNotAllowed { allowed } => {
                let allow = allowed
                    .iter()
                    .map(|method| method.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut response = Problem::new(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "method_not_allowed",
                    format!("{method} is not allowed on {}", req.uri().path()),
                )
                .with_request_id(request_id(req.headers()))
                .into_response();
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                Ok(response)
            }
            RouteMatch::NotFound => Ok(Problem::new(
                StatusCode::NOT_FOUND,
                "route_not_found",
                format!("No route matches {}", req.uri().path()),
            )
            .with_request_id(request_id(req.headers()))
            .into_response()),
        }
    }
}
