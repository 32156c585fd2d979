//! Transport upgrade: redirect plain HTTP to HTTPS.
//!
//! TLS terminates in front of the service, so the original scheme comes
//! from `X-Forwarded-Proto` when that header is trusted.

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::uri::Authority;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::ListenerConfig;
use crate::http::error::ApiError;
use crate::http::pipeline::{Next, Stage};
use crate::http::request::X_FORWARDED_PROTO;

pub struct HttpsRedirect {
    https_port: Option<u16>,
    trust_forwarded_proto: bool,
}

impl HttpsRedirect {
    pub fn new(https_port: Option<u16>, trust_forwarded_proto: bool) -> Self {
        Self {
            https_port,
            trust_forwarded_proto,
        }
    }

    pub fn from_config(config: &ListenerConfig) -> Self {
        Self::new(config.https_port, config.trust_forwarded_proto)
    }

    fn is_secure(&self, req: &Request) -> bool {
        if self.trust_forwarded_proto {
            if let Some(proto) = req.headers().get(X_FORWARDED_PROTO).and_then(|v| v.to_str().ok()) {
                // First hop wins in a comma separated chain.
                let first = proto.split(',').next().unwrap_or_default().trim();
                return first.eq_ignore_ascii_case("https");
            }
        }
        req.uri().scheme_str() == Some("https")
    }

    fn location(&self, req: &Request, port: u16) -> Option<String> {
        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Authority>().ok())
            .map(|authority| authority.host().to_string())
            .or_else(|| req.uri().host().map(str::to_string))?;

        let path = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Some(if port == 443 {
            format!("https://{host}{path}")
        } else {
            format!("https://{host}:{port}{path}")
        })
    }
}

#[async_trait]
impl Stage for HttpsRedirect {
    fn name(&self) -> &'static str {
        "https-redirect"
    }

    async fn handle(&self, req: Request, next: Next<'_>) -> Result<Response, ApiError> {
        let Some(port) = self.https_port else {
            return next.run(req).await;
        };
        if self.is_secure(&req) {
            return next.run(req).await;
        }

        match self.location(&req, port).and_then(|l| HeaderValue::from_str(&l).ok()) {
            Some(location) => Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()),
            None => {
                tracing::warn!("Cannot redirect to HTTPS without a host; passing the request through");
                next.run(req).await
            }
        }
    }
}
