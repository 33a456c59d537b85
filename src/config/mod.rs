use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. When absent the in-memory store is used.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for HS256 tokens.
    pub jwt_secret: Option<String>,
    /// Auth0 tenant domain; selects RS256/JWKS verification when set.
    pub auth0_domain: Option<String>,
    pub auth0_audience: Option<String>,
    /// Claim holding the caller's email address.
    pub email_claim: String,
    pub jwks_cache_secs: u64,
    /// Lifetime of locally issued development tokens.
    pub token_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

/// Partial configuration read from a YAML or JSON file. Any section left out
/// keeps the environment preset.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server: Option<ServerConfig>,
    database: Option<DatabaseConfig>,
    auth: Option<AuthConfig>,
    api: Option<ApiConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::preset(Self::environment_from_env()).with_env_overrides()
    }

    /// Preset for `APP_ENV`, then `path` (YAML or JSON), then env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::preset(Self::environment_from_env());
        if let Some(path) = path {
            config = config.with_file(path)?;
        }
        Ok(config.with_env_overrides())
    }

    fn environment_from_env() -> Environment {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }

    fn preset(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_file(self, path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        self.with_file_contents(&raw)
            .map_err(|source| ConfigError::Parse { path: display, source })
    }

    // serde_yaml also accepts JSON documents
    fn with_file_contents(mut self, raw: &str) -> Result<Self, serde_yaml::Error> {
        let file: FileConfig = serde_yaml::from_str(raw)?;
        if let Some(server) = file.server {
            self.server = server;
        }
        if let Some(database) = file.database {
            self.database = database;
        }
        if let Some(auth) = file.auth {
            self.auth = auth;
        }
        if let Some(api) = file.api {
            self.api = api;
        }
        Ok(self)
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("MTGJSON_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|url| !url.is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Auth overrides
        if let Ok(v) = env::var("AUTH_JWT_SECRET") {
            self.auth.jwt_secret = Some(v).filter(|secret| !secret.is_empty());
        }
        if let Ok(v) = env::var("AUTH0_DOMAIN") {
            self.auth.auth0_domain = Some(v).filter(|domain| !domain.is_empty());
        }
        if let Ok(v) = env::var("AUTH0_AUDIENCE") {
            self.auth.auth0_audience = Some(v).filter(|audience| !audience.is_empty());
        }
        if let Ok(v) = env::var("AUTH_EMAIL_CLAIM") {
            self.auth.email_claim = v;
        }
        if let Ok(v) = env::var("AUTH_JWKS_CACHE_SECS") {
            self.auth.jwks_cache_secs = v.parse().unwrap_or(self.auth.jwks_cache_secs);
        }
        if let Ok(v) = env::var("AUTH_TOKEN_EXPIRY_HOURS") {
            self.auth.token_expiry_hours = v.parse().unwrap_or(self.auth.token_expiry_hours);
        }

        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_LIMIT") {
            self.api.default_limit = v.parse().unwrap_or(self.api.default_limit);
        }
        if let Ok(v) = env::var("API_MAX_LIMIT") {
            self.api.max_limit = v.parse().unwrap_or(self.api.max_limit);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 8080 },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            auth: AuthConfig::default_for(24 * 7),
            api: ApiConfig {
                default_limit: 100,
                max_limit: 1000,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 8080 },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            auth: AuthConfig::default_for(24),
            api: ApiConfig {
                default_limit: 100,
                max_limit: 500,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 8080 },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            auth: AuthConfig::default_for(4),
            api: ApiConfig {
                default_limit: 100,
                max_limit: 100,
            },
        }
    }

    /// Resolve a raw `limit` query value: unparsable or non-positive falls
    /// back to the default, large values are capped.
    pub fn effective_limit(&self, raw: Option<&str>) -> i64 {
        raw.and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(self.api.default_limit)
            .min(self.api.max_limit)
    }
}

impl AuthConfig {
    fn default_for(token_expiry_hours: u64) -> Self {
        Self {
            jwt_secret: None,
            auth0_domain: None,
            auth0_audience: None,
            email_claim: "email".to_string(),
            jwks_cache_secs: 300,
            token_expiry_hours,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.api.default_limit, 100);
        assert!(config.database.url.is_none());
        assert_eq!(config.auth.email_claim, "email");
        assert_eq!(config.auth.jwks_cache_secs, 300);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.api.max_limit, 100);
        assert_eq!(config.auth.token_expiry_hours, 4);
    }

    #[test]
    fn limit_defaults_and_caps() {
        let config = AppConfig::development();
        assert_eq!(config.effective_limit(None), 100);
        assert_eq!(config.effective_limit(Some("25")), 25);
        assert_eq!(config.effective_limit(Some("abc")), 100);
        assert_eq!(config.effective_limit(Some("-3")), 100);
        assert_eq!(config.effective_limit(Some("5000")), 1000);
    }

    #[test]
    fn file_sections_override_preset() {
        let yaml = r#"
server:
  port: 2100
auth:
  jwt_secret: dev-secret
  auth0_domain: null
  auth0_audience: null
  email_claim: "https://mtgjson.example/email"
  jwks_cache_secs: 60
  token_expiry_hours: 1
"#;
        let config = AppConfig::development().with_file_contents(yaml).unwrap();
        assert_eq!(config.server.port, 2100);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("dev-secret"));
        assert_eq!(config.auth.email_claim, "https://mtgjson.example/email");
        // untouched section keeps the preset
        assert_eq!(config.api.default_limit, 100);
    }

    #[test]
    fn json_config_files_parse() {
        let json = r#"{ "api": { "default_limit": 50, "max_limit": 200 } }"#;
        let config = AppConfig::development().with_file_contents(json).unwrap();
        assert_eq!(config.api.default_limit, 50);
        assert_eq!(config.api.max_limit, 200);
    }
}
