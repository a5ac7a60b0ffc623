//! store-server — storefront backend
//!
//! Long-running service that:
//! - Serves the catalog, cart, wallet and order APIs (axum)
//! - Converts carts into pending orders and settles them asynchronously
//!   against per-user wallets (durable queue + row-locked transactions)
//! - Keeps the full-text product index eventually consistent with the
//!   relational store (index-sync worker + startup resynchronization)

mod api;
mod auth;
mod cache;
mod config;
mod db;
mod error;
mod queue;
mod search;
mod state;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "store_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting store-server (env: {})", config.environment);

    // Initialize application state (pool, migrations, queue, index, cache)
    let state = AppState::new(&config).await?;

    // Heal index drift accumulated while the consumers were offline
    match queue::index_sync::rebuild(&state.pool, &state.search).await {
        Ok(count) => tracing::info!(products = count, "Startup index resynchronization complete"),
        Err(e) => tracing::error!(error = %e, "Startup index resynchronization failed"),
    }

    // Consumer workers: each processes one message at a time
    tokio::spawn(queue::settlement::run(state.clone()));
    tokio::spawn(queue::index_sync::run(state.clone()));

    // HTTP server
    let app = api::create_router(state.clone());
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("store-server HTTP listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.close().await;
    tracing::info!("store-server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown signal received");
}
