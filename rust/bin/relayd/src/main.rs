//! `subsearch-relayd`: credential-holding relay in front of the content API.
//!
//! Usage:
//!   subsearch-relayd [-c <config.toml>] [--listen <addr>]
//!
//! Credentials come from the config file or `REDDIT_CLIENT_ID` /
//! `REDDIT_CLIENT_SECRET`; they never leave this process.

mod config;
mod error;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use subsearch_client::{ClientCredentials, UpstreamClient};
use tracing::info;

use config::RelayConfig;
use routes::AppState;

/// Search relay server.
#[derive(Parser, Debug)]
#[command(name = "subsearch-relayd", about = "Credential-holding search relay")]
struct Cli {
    /// Path to config file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Listen address (overrides config and PORT; default 0.0.0.0:3001).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        info!("Loading configuration from {}", path.display());
    }
    let mut relay_config = RelayConfig::load(cli.config.as_deref())?;
    relay_config.apply_env(|key| std::env::var(key).ok())?;
    relay_config.validate()?;

    let reddit = &relay_config.reddit;
    let mut tokens = ClientCredentials::new(&reddit.client_id, &reddit.client_secret)
        .with_auth_base(&reddit.auth_base);
    if let Some(ua) = &reddit.user_agent {
        tokens = tokens.with_user_agent(ua);
    }
    let mut upstream = UpstreamClient::new(Arc::new(tokens)).with_api_base(&reddit.api_base);
    if let Some(ua) = &reddit.user_agent {
        upstream = upstream.with_user_agent(ua);
    }
    info!("Upstream API at {} (token host {})", reddit.api_base, reddit.auth_base);

    let app = routes::build_router(AppState { upstream });

    let listen = cli.listen.unwrap_or_else(|| relay_config.listen_addr());
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!("Relay listening on {}", listen);
    axum::serve(listener, app).await?;

    Ok(())
}
