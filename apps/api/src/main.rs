mod analysis;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::dispatcher::AnalysisDispatcher;
use crate::analysis::provider::LlmInferenceProvider;
use crate::config::Config;
use crate::db::{create_pool, resolve_capabilities};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgAnalysisStore;
use crate::store::CredentialScope;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Analysis API v{}", env!("CARGO_PKG_VERSION"));

    // Two roles: caller-scoped (row-level security) and elevated
    let caller_pool = create_pool(&config.database_url, "caller").await?;
    let elevated_pool = create_pool(&config.elevated_database_url, "elevated").await?;

    let capabilities = resolve_capabilities(&elevated_pool).await?;
    info!("Cache capabilities: {capabilities:?}");

    let elevated = Arc::new(PgAnalysisStore::new(
        elevated_pool,
        CredentialScope::Elevated,
        capabilities,
    ));

    // Initialize LLM-backed inference provider
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    info!(
        "LLM client initialized (model: {}, timeout: {}s)",
        llm_client::MODEL,
        config.llm_timeout_secs
    );
    let provider = Arc::new(LlmInferenceProvider(llm));

    let dispatcher = AnalysisDispatcher::start(
        elevated.clone(),
        provider.clone(),
        config.analysis_workers,
        config.analysis_queue_capacity,
    );

    let state = AppState {
        caller_pool,
        elevated,
        capabilities,
        provider,
        dispatcher,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
