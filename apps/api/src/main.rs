mod assessment;
mod config;
mod errors;
mod llm_client;
mod matching;
mod pipeline;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::matching::taxonomy::TAXONOMY_VERSION;
use crate::pipeline::cache::AssessmentCache;
use crate::pipeline::model_assessor::{DisabledModelAssessor, LlmModelAssessor, ModelAssessor};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
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

    info!("Starting recruiter API v{}", env!("CARGO_PKG_VERSION"));
    info!("Skill taxonomy version {TAXONOMY_VERSION}");

    // Model collaborator: disabled unless an API key is configured
    let model: Arc<dyn ModelAssessor> = match &config.llm_api_key {
        Some(api_key) => {
            let llm = LlmClient::new(
                api_key.clone(),
                config.llm_base_url.clone(),
                config.llm_model.clone(),
            )
            .context("failed to build LLM HTTP client")?;
            info!("LLM client initialized (model: {})", llm.model());
            let cache = Arc::new(AssessmentCache::new(
                Duration::from_secs(config.cache_ttl_secs),
                config.cache_capacity,
            ));
            Arc::new(LlmModelAssessor::new(llm, cache))
        }
        None => {
            info!("LLM_API_KEY not set, assessments are rule-only");
            Arc::new(DisabledModelAssessor)
        }
    };

    info!(
        "Scoring: weights {:?}, alpha {}, gate cap {}, {} workers",
        config.weights, config.hybrid_alpha, config.policy.gate_cap, config.max_workers
    );

    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        model,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
