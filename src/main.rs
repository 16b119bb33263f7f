//! codex-bridge - Anthropic Messages API gateway to ChatGPT Codex
//!
//! Accepts Anthropic-shaped requests on `/v1/messages`, translates them to
//! the Codex Responses API, consumes the backend fully buffered, and
//! replies either as plain JSON or as a synthetic SSE replay.

mod auth;
mod backend;
mod cli;
mod config;
mod error;
mod models;
mod protocol;
mod server;
mod stream;
mod translate;

use anyhow::Result;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI subcommands (config, auth); these exit before serving
    if cli::handle_cli() {
        return Ok(());
    }

    // Create config template on first run so options are discoverable
    Config::ensure_config_exists();

    let config = Config::from_env();

    // Precedence: RUST_LOG env var > config file > default "info"
    let default_filter = format!("codex_bridge={},tower_http=debug,axum=debug", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("codex-bridge v{} starting", config::VERSION);
    tracing::info!("Backend: {}", config.base_url);

    // Warn early when the server will only produce 401s
    if let Err(e) = auth::credentials() {
        tracing::warn!("{}", e);
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let server = tokio::spawn(server::start_server(config, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(());

    server.await??;
    Ok(())
}
