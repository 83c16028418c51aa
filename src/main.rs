mod app;
mod config;
mod data;
mod error;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use app::build_router;
use config::Config;
use data::loader::load_file;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    // The table must be complete before anything is served.
    let opts = config.load_options().context("reading header map")?;
    let table = load_file(&config.data, &opts)
        .with_context(|| format!("loading cutoff data from {}", config.data.display()))?;
    if table.is_empty() {
        log::warn!("{} contains no data rows", config.data.display());
    }

    let state = Arc::new(AppState::new(table, config.window()));
    let router = build_router(state, !config.no_cors);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    log::info!("Server running at http://{}", config.listen);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
