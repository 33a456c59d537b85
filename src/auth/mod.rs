pub mod claims;
pub mod ownership;
pub mod scope;
pub mod verifier;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use claims::{extract_identity, AuthUser};
pub use ownership::{authorize, Action, Grant, ResourceKind, Tier, SYSTEM_OWNER};
pub use scope::ScopeSet;
pub use verifier::{HmacVerifier, JwksVerifier, TokenVerifier};

/// Claims of an already verified access token.
///
/// Only `scope` is interpreted directly; everything else (including the
/// email claim, whose name is configurable) stays in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifiedClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerifiedClaims {
    /// Claims for a locally issued development token.
    pub fn new(email: &str, scope: &str, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        let mut extra = Map::new();
        extra.insert("email".to_string(), Value::String(email.to_string()));

        Self {
            sub: Some(email.to_string()),
            scope: scope.to_string(),
            exp: Some(exp),
            iat: Some(now.timestamp()),
            extra,
        }
    }

    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is missing from request")]
    MissingToken,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("Token is not valid: {0}")]
    InvalidToken(String),

    #[error("Token does not carry the '{0}' claim needed to establish ownership")]
    MissingEmail(String),

    #[error("Token verifier unavailable: {0}")]
    VerifierUnavailable(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Sign `claims` with HS256. Used for local development tokens only; production
/// tokens come from the identity provider.
pub fn generate_jwt(secret: &str, claims: &VerifiedClaims) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}
