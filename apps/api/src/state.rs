use std::sync::Arc;

use crate::chat::engine::TurnEngine;
use crate::config::Config;
use crate::corpus::JobCorpus;
use crate::llm_client::CompletionProvider;
use crate::matching::JobMatcher;
use crate::profile::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub corpus: Arc<JobCorpus>,
    /// Timeout-wrapped provider shared by every inference call.
    pub llm: Arc<dyn CompletionProvider>,
    /// Pluggable matcher. Default: LlmJobMatcher. Swap via MATCH_SCORER.
    pub matcher: Arc<dyn JobMatcher>,
    pub profiles: Arc<dyn ProfileStore>,
    pub engine: Arc<TurnEngine>,
}

impl AppState {
    pub fn new(
        config: Config,
        corpus: Arc<JobCorpus>,
        llm: Arc<dyn CompletionProvider>,
        matcher: Arc<dyn JobMatcher>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        let engine = Arc::new(TurnEngine::new(
            corpus.clone(),
            llm.clone(),
            matcher.clone(),
            profiles.clone(),
            config.match_top_n,
        ));
        Self {
            config,
            corpus,
            llm,
            matcher,
            profiles,
            engine,
        }
    }
}
