//! EPD Frame Daemon
//!
//! Receives packed panel buffers over TCP and displays them on the e-paper panel.

mod config;
mod server;
mod state;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = Config::load(&config_path).context("Failed to load configuration")?;
    info!("Loaded configuration from: {}", config_path);

    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    // Panel init blocks on reset delays and busy waits
    let state = Arc::new(
        tokio::task::spawn_blocking(move || AppState::new(config))
            .await
            .context("Panel init task panicked")?,
    );
    info!("Render server listening on {}", listener.local_addr()?);

    // Setup Unix signal handlers
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    tokio::select! {
        result = server::serve(listener, state.clone()) => {
            result?;
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
    }

    tokio::task::spawn_blocking(move || state.shutdown())
        .await
        .context("Shutdown task panicked")??;
    info!("Panel asleep, exiting");

    Ok(())
}
