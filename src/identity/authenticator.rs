//! Turning request credentials into a [`Principal`].

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use std::sync::Arc;
use thiserror::Error;

use crate::identity::tokens::TokenService;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            name: name.into(),
            roles,
        }
    }

    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("no bearer token was supplied")]
    MissingCredentials,

    #[error("bearer token is invalid: {0}")]
    InvalidToken(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Scheme named in `WWW-Authenticate` challenges.
    fn scheme(&self) -> &'static str {
        "Bearer"
    }

    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthFailure>;
}

/// Validates `Authorization: Bearer <jwt>`.
pub struct JwtAuthenticator {
    tokens: Arc<TokenService>,
}

impl JwtAuthenticator {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthFailure> {
        let token = bearer_token(headers).ok_or(AuthFailure::MissingCredentials)?;
        let claims = self
            .tokens
            .validate(token)
            .map_err(|err| AuthFailure::InvalidToken(err.to_string()))?;
        Ok(Principal::new(claims.sub, claims.roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Duration;

    fn authenticator() -> (JwtAuthenticator, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::new(
            b"SecretKeyOfDoomThatMustBeAMinimumNumberOfBytes",
            Duration::from_secs(60),
        ));
        (JwtAuthenticator::new(tokens.clone()), tokens)
    }

    #[tokio::test]
    async fn test_valid_bearer_token() {
        let (auth, tokens) = authenticator();
        let token = tokens.issue("admin@microsoft.com", vec!["Administrators".into()]).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let principal = auth.authenticate(&headers).await.unwrap();
        assert_eq!(principal.name, "admin@microsoft.com");
        assert!(principal.is_in_role("administrators"));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_credentials() {
        let (auth, _) = authenticator();
        assert_eq!(
            auth.authenticate(&HeaderMap::new()).await,
            Err(AuthFailure::MissingCredentials)
        );

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(auth.authenticate(&headers).await, Err(AuthFailure::MissingCredentials));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(matches!(
            auth.authenticate(&headers).await,
            Err(AuthFailure::InvalidToken(_))
        ));
    }
}
