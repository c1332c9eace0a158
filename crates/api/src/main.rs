//! Cadence - field-activity tracking backend
//!
//! Binary entry point: loads configuration, wires the application context,
//! and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use cadence_api::{build_router, AppContext};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env loading
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables from .env file
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => info!(%err, "no .env file loaded"),
    }

    let config = cadence_infra::config::load().context("configuration could not be loaded")?;
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let ctx = Arc::new(AppContext::new(config).context("application context failed to start")?);
    info!(db_path = %ctx.db.path().display(), "cadence initialized");

    let app = build_router(ctx);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
