use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header,
    jwk::{Jwk, JwkSet},
    Algorithm, DecodingKey, Validation,
};
use tokio::sync::RwLock;
use url::Url;

use super::{AuthError, VerifiedClaims};

/// Verifies a raw bearer token and returns its claims.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError>;
}

/// HS256 tokens signed with a shared secret.
pub struct HmacVerifier {
    secret: String,
}

impl HmacVerifier {
    pub fn new(secret: impl Into<String>) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        Ok(Self { secret })
    }

    /// Mint a token this verifier accepts.
    pub fn issue(&self, claims: &VerifiedClaims) -> Result<String, AuthError> {
        super::generate_jwt(&self.secret, claims)
    }
}

#[async_trait]
impl TokenVerifier for HmacVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        decode::<VerifiedClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// RS256 tokens issued by an Auth0-style tenant, checked against its JWKS.
pub struct JwksVerifier {
    issuer: Url,
    jwks_url: Url,
    audience: String,
    cache_ttl: Duration,
    client: reqwest::Client,
    keys: RwLock<Option<(Instant, JwkSet)>>,
}

impl JwksVerifier {
    /// `domain` is the bare tenant host, e.g. `example.us.auth0.com`.
    pub fn new(domain: &str, audience: impl Into<String>, cache_ttl: Duration) -> Result<Self, AuthError> {
        let issuer = Url::parse(&format!("https://{}/", domain.trim_end_matches('/')))
            .map_err(|e| AuthError::VerifierUnavailable(format!("invalid issuer domain: {e}")))?;
        let jwks_url = issuer
            .join(".well-known/jwks.json")
            .map_err(|e| AuthError::VerifierUnavailable(e.to_string()))?;

        Ok(Self {
            issuer,
            jwks_url,
            audience: audience.into(),
            cache_ttl,
            client: reqwest::Client::new(),
            keys: RwLock::new(None),
        })
    }

    /// Fetch keys from `url` instead of the issuer's well-known location.
    pub fn with_jwks_url(mut self, url: Url) -> Self {
        self.jwks_url = url;
        self
    }

    pub fn issuer(&self) -> &str {
        self.issuer.as_str()
    }

    async fn cached_keys(&self) -> Option<JwkSet> {
        let cached = self.keys.read().await;
        cached
            .as_ref()
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.cache_ttl)
            .map(|(_, keys)| keys.clone())
    }

    async fn refresh(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!("Refreshing JWKS from {}", self.jwks_url);

        let keys: JwkSet = self
            .client
            .get(self.jwks_url.clone())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| AuthError::VerifierUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::VerifierUnavailable(e.to_string()))?;

        *self.keys.write().await = Some((Instant::now(), keys.clone()));
        Ok(keys)
    }

    /// Key `kid` from the cached set. A kid the cache doesn't know forces one
    /// refetch, so rotated keys are picked up before the TTL runs out.
    async fn signing_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(keys) = self.cached_keys().await {
            if let Some(jwk) = keys.find(kid) {
                return Ok(jwk.clone());
            }
            tracing::debug!("Signing key '{}' not in cached JWKS", kid);
        }

        self.refresh()
            .await?
            .find(kid)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken(format!("unknown signing key '{kid}'")))
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("token header has no key id".to_string()))?;

        let jwk = self.signing_key(&kid).await?;
        let decoding_key = DecodingKey::from_jwk(&jwk).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);

        decode::<VerifiedClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hmac_round_trip_preserves_claims() {
        let verifier = HmacVerifier::new("test-secret").unwrap();
        let token = verifier
            .issue(&VerifiedClaims::new("alice@x.com", "read:deck write:deck", 1))
            .unwrap();

        let claims = verifier.verify(&token).await.unwrap();
        assert_eq!(claims.scope, "read:deck write:deck");
        assert_eq!(claims.claim_str("email"), Some("alice@x.com"));
    }

    #[tokio::test]
    async fn hmac_rejects_foreign_signature() {
        let issuer = HmacVerifier::new("one").unwrap();
        let verifier = HmacVerifier::new("two").unwrap();
        let token = issuer.issue(&VerifiedClaims::new("alice@x.com", "read:card", 1)).unwrap();

        assert!(matches!(verifier.verify(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(HmacVerifier::new("").err(), Some(AuthError::InvalidSecret));
    }

    #[test]
    fn jwks_issuer_is_normalised() {
        let verifier = JwksVerifier::new("tenant.auth0.com/", "api", Duration::from_secs(300)).unwrap();
        assert_eq!(verifier.issuer(), "https://tenant.auth0.com/");
    }

    fn rsa_jwk(kid: &str) -> serde_json::Value {
        serde_json::json!({ "kty": "RSA", "kid": kid, "use": "sig", "alg": "RS256", "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw", "e": "AQAB" })
    }

    #[tokio::test]
    async fn unknown_key_id_refreshes_the_key_set_once() {
        use std::sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        };

        use axum::{routing::get, Json, Router};

        // first fetch serves the old key only, later fetches add the rotated one
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();
        let app = Router::new().route(
            "/jwks.json",
            get(move || {
                let counter = counter.clone();
                async move {
                    let kids: &[&str] = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        &["old"]
                    } else {
                        &["old", "new"]
                    };
                    let keys: Vec<_> = kids.iter().map(|kid| rsa_jwk(kid)).collect();
                    Json(serde_json::json!({ "keys": keys }))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let verifier = JwksVerifier::new("tenant.auth0.com", "api", Duration::from_secs(300))
            .unwrap()
            .with_jwks_url(Url::parse(&format!("http://{addr}/jwks.json")).unwrap());

        verifier.signing_key("old").await.unwrap();
        verifier.signing_key("old").await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        verifier.signing_key("new").await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        let err = verifier.signing_key("retired").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }
}
