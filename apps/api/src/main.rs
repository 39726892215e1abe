mod config;
mod errors;
mod interview;
mod llm_client;
mod models;
mod routes;
mod simulation;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::session::SessionStore;
use crate::llm_client::ChatClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgProfileStore;

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

    info!("Starting Matchbook API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the profile store
    let store = Arc::new(PgProfileStore::connect(&config.database_url).await?);

    // Initialize the chat client
    let llm = Arc::new(ChatClient::new(
        config.llm_api_key.clone(),
        config.llm_endpoint.clone(),
    ));
    info!("Chat client initialized (model: {})", llm_client::MODEL);

    // Interview sessions live in-process only; a restart drops them.
    let sessions = Arc::new(SessionStore::default());

    // Build app state
    let state = AppState {
        llm,
        store,
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
