use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::auth::{HmacVerifier, JwksVerifier, TokenVerifier};
use crate::config::AppConfig;
use crate::database::{DocumentStore, MemoryStore, PgDocumentStore};

/// Shared request context, handed to every handler through router state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            verifier,
        }
    }

    /// Connect the configured store and build the configured verifier.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store = build_store(&config).await?;
        let verifier = build_verifier(&config)?;
        Ok(Self::new(config, store, verifier))
    }
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    if config.database.url.is_none() {
        tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on exit)");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgDocumentStore::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    store.migrate().await.context("failed to prepare documents table")?;
    tracing::info!("Connected to PostgreSQL document store");

    Ok(Arc::new(store))
}

fn build_verifier(config: &AppConfig) -> anyhow::Result<Arc<dyn TokenVerifier>> {
    let auth = &config.auth;

    if let Some(domain) = &auth.auth0_domain {
        let Some(audience) = &auth.auth0_audience else {
            bail!("AUTH0_AUDIENCE is required when AUTH0_DOMAIN is set");
        };
        let verifier = JwksVerifier::new(domain, audience.clone(), Duration::from_secs(auth.jwks_cache_secs))?;
        tracing::info!("Verifying RS256 tokens issued by {}", verifier.issuer());
        return Ok(Arc::new(verifier));
    }

    if let Some(secret) = &auth.jwt_secret {
        tracing::info!("Verifying HS256 tokens with shared secret");
        return Ok(Arc::new(HmacVerifier::new(secret.clone())?));
    }

    bail!("no token verifier configured: set AUTH0_DOMAIN or AUTH_JWT_SECRET")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_and_hmac_without_database() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("secret".into());
        let state = AppState::from_config(config).await.unwrap();
        assert!(state.store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn missing_verifier_configuration_fails() {
        let config = AppConfig::default();
        assert!(AppState::from_config(config).await.is_err());
    }

    #[test]
    fn auth0_requires_audience() {
        let mut config = AppConfig::default();
        config.auth.auth0_domain = Some("tenant.auth0.com".into());
        assert!(build_verifier(&config).is_err());

        config.auth.auth0_audience = Some("https://api.mtgjson.com".into());
        assert!(build_verifier(&config).is_ok());
    }
}
