mod config;
mod dashboard;
mod data;
mod errors;
mod feeds;
mod metrics;
mod routes;
mod state;
mod views;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::feeds::HttpFeedSource;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; a malformed variable aborts startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting COVID-19 dashboard v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Variant {:?}: dataset={} countries={} live={}",
        config.variant, config.dataset_url, config.countries_url, config.timeseries_base_url
    );

    // Initialize the outbound feed client
    let feeds = HttpFeedSource::new(
        Duration::from_secs(config.fetch_timeout_secs),
        config.fetch_max_retries,
    )
    .context("Failed to build HTTP client")?;
    info!(
        "Feed client initialized (timeout {}s, {} attempts)",
        config.fetch_timeout_secs, config.fetch_max_retries
    );

    let state = AppState::new(config.clone(), Arc::new(feeds));

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
