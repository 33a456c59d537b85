#![allow(dead_code)]

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use mtgjson_api::auth::{generate_jwt, HmacVerifier, VerifiedClaims};
use mtgjson_api::config::AppConfig;
use mtgjson_api::database::{DocumentStore, MemoryStore};
use mtgjson_api::state::AppState;

pub const SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    /// Same store the server uses, for seeding and asserting on writes
    pub store: MemoryStore,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}/api/v1", port);
        let store = MemoryStore::new();

        let mut config = AppConfig::default();
        config.server.port = port;
        config.auth.jwt_secret = Some(SECRET.to_string());

        let verifier = Arc::new(HmacVerifier::new(SECRET)?);
        let state = AppState::new(config, Arc::new(store.clone()), verifier);

        // Each #[tokio::test] has its own runtime; the server needs one that
        // outlives them all.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test server runtime");
            runtime.block_on(async move {
                if let Err(e) = mtgjson_api::server::serve(state).await {
                    eprintln!("test server exited: {e:#}");
                }
            });
        });

        Ok(Self { port, base_url, store })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Insert a catalog card directly and return its id.
    pub async fn seed_card(&self, name: &str) -> Result<String> {
        let id = card_id();
        self.store
            .insert(
                "card",
                &json!({
                    "name": name,
                    "identifiers": { "mtgjsonV4Id": id },
                    "mtgjsonApiMeta": null
                }),
            )
            .await?;
        Ok(id)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to start test server"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// HS256 token for `email` carrying `scope`.
pub fn token(email: &str, scope: &str) -> String {
    generate_jwt(SECRET, &VerifiedClaims::new(email, scope, 1)).expect("sign test token")
}

/// Attach a bearer token to `request`.
pub fn bearer(request: RequestBuilder, email: &str, scope: &str) -> RequestBuilder {
    request.bearer_auth(token(email, scope))
}

/// Email unique to one test run, so tests sharing the server don't collide.
pub fn unique_email(name: &str) -> String {
    format!("{name}-{}@test.mtgjson", &Uuid::new_v4().simple().to_string()[..8])
}

/// Deck/set code unique to one test run.
pub fn unique_code(prefix: &str) -> String {
    format!("{prefix}{}", &Uuid::new_v4().simple().to_string()[..8]).to_uppercase()
}

/// Fresh, well-formed card id that no card has.
pub fn card_id() -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, Uuid::new_v4().as_bytes()).to_string()
}

pub async fn json(response: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = response.status();
    let body = response.json::<Value>().await?;
    Ok((status, body))
}
