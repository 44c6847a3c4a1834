mod chat;
mod config;
mod corpus;
mod errors;
mod llm_client;
mod matching;
mod models;
mod profile;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, ScorerBackend};
use crate::corpus::load_jobs;
use crate::llm_client::{CompletionProvider, LlmClient, TimeoutProvider};
use crate::matching::{JobMatcher, KeywordJobMatcher, LlmJobMatcher};
use crate::profile::store::{InMemoryProfileStore, ProfileStore};
use crate::routes::build_router;
use crate::state::AppState;

/// How often idle conversations are swept.
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

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

    info!("Starting jobchat API v{}", env!("CARGO_PKG_VERSION"));

    // Load the job corpus once; it is read-only from here on
    let corpus = Arc::new(load_jobs(&config.jobs_path)?);

    // Initialize LLM client; retries share the per-call budget
    let client = LlmClient::new(config.groq_api_key.clone(), config.llm_timeout)?;
    let llm: Arc<dyn CompletionProvider> = Arc::new(TimeoutProvider::new(client, config.llm_timeout));
    info!(
        "LLM client initialized (model: {}, call timeout: {:?}, attempt timeout: {:?})",
        llm_client::MODEL,
        config.llm_timeout,
        llm_client::attempt_timeout(config.llm_timeout)
    );

    let matcher: Arc<dyn JobMatcher> = match config.match_scorer {
        ScorerBackend::Llm => Arc::new(LlmJobMatcher::new(llm.clone())),
        ScorerBackend::Keyword => Arc::new(KeywordJobMatcher),
    };
    info!("Job matcher: {}", matcher.backend());

    let profiles: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
    spawn_eviction(profiles.clone(), config.conversation_ttl);

    let state = AppState::new(config.clone(), corpus, llm, matcher, profiles);

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the web client has a fixed host
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Sweeps conversations idle for longer than `ttl` in the background.
fn spawn_eviction(profiles: Arc<dyn ProfileStore>, ttl: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            ticker.tick().await;
            profiles.evict_idle(ttl).await;
        }
    });
}
