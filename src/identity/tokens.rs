//! JWT issuing and validation (HS256).

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::config::IdentityConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User name.
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iat: u64,
    pub exp: u64,
}

/// Signing material plus token lifetime.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            Duration::from_secs(config.token_lifetime_hours * 3600),
        )
    }

    pub fn issue(&self, user_name: &str, roles: Vec<String>) -> Result<String, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let claims = Claims {
            sub: user_name.to_string(),
            roles,
            iat: now,
            exp: now + self.lifetime.as_secs(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &"HS256")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"SecretKeyOfDoomThatMustBeAMinimumNumberOfBytes";

    #[test]
    fn test_issue_then_validate() {
        let tokens = TokenService::new(SECRET, Duration::from_secs(3600));
        let token = tokens
            .issue("admin@microsoft.com", vec!["Administrators".into()])
            .unwrap();

        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.sub, "admin@microsoft.com");
        assert_eq!(claims.roles, vec!["Administrators".to_string()]);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let ours = TokenService::new(SECRET, Duration::from_secs(3600));
        let theirs = TokenService::new(b"another-secret-that-is-long-enough!!", Duration::from_secs(3600));
        let token = theirs.issue("demouser@microsoft.com", Vec::new()).unwrap();
        assert!(matches!(ours.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = TokenService::new(SECRET, Duration::from_secs(3600));
        assert!(tokens.validate("not.a.jwt").is_err());
    }
}
