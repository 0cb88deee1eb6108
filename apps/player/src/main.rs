mod backend;
mod config;
mod embed;
mod errors;
mod models;
mod notify;
mod player;
mod routes;
mod session;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backend::HttpBackend;
use crate::config::Config;
use crate::embed::youtube::NoembedProbe;
use crate::notify::Notifier;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PathForge player v{}", env!("CARGO_PKG_VERSION"));

    let backend = Arc::new(HttpBackend::new(
        &config.api_url,
        config.id_token.clone(),
        Duration::from_secs(config.backend_timeout_secs),
    ));
    info!("Backend client initialized ({})", config.api_url);

    let policy = config.policy();
    let probe = Arc::new(NoembedProbe::new(policy.probe_timeout));
    info!(
        "Player policy: complete at {:.0}%, persist every {}s, tick {:?}",
        policy.completion_threshold * 100.0,
        policy.persist_every_secs,
        policy.tick_period
    );

    let notifier = Notifier::new(chrono::Duration::seconds(config.notification_ttl_secs));
    let state = AppState::new(backend, probe, notifier, policy);

    state
        .session
        .sign_in(config.id_token.clone())
        .await
        .context("Failed to verify PATHFORGE_ID_TOKEN with the backend")?;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
