use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::auth::{generate_jwt, VerifiedClaims};
use crate::config::AppConfig;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "mtgjson-api")]
#[command(about = "Ownership-aware metadata API for MTGJSON cards, decks and sets")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (YAML or JSON) layered over the environment preset")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Log at debug level unless RUST_LOG is set")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides config and environment)")]
        port: Option<u16>,
    },

    #[command(about = "Mint an HS256 token with the configured secret (development only)")]
    Token {
        #[arg(long, help = "Email claim of the token")]
        email: String,
        #[arg(long, default_value = "", help = "Space-delimited scopes, e.g. \"read:deck write:deck\"")]
        scope: String,
    },
}

pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mtgjson_api={default_level},tower_http={default_level}")));

    // ignore double init in tests
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            tracing::info!("Starting MTGJSON API in {:?} mode", config.environment);

            let state = AppState::from_config(config).await?;
            crate::server::serve(state).await
        }
        Commands::Token { email, scope } => {
            let secret = config
                .auth
                .jwt_secret
                .as_deref()
                .context("AUTH_JWT_SECRET must be set to mint tokens")?;

            let claims = VerifiedClaims::new(&email, &scope, config.auth.token_expiry_hours);
            println!("{}", generate_jwt(secret, &claims)?);
            Ok(())
        }
    }
}
