//! Job Matching: pluggable, trait-based ranking of corpus jobs against a user profile.
//!
//! Default: `LlmJobMatcher` (semantic scores 0–100 via the provider).
//! Alternative: `KeywordJobMatcher` (pure-Rust, deterministic, unbounded integer score).
//!
//! `AppState` holds an `Arc<dyn JobMatcher>`, swapped at startup via `MATCH_SCORER`.
//! Every report carries `scorer` so consumers know which scale the scores use.

pub mod handlers;
pub mod keyword;
pub mod llm;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::job::Job;
use crate::models::profile::UserProfile;

pub use keyword::KeywordJobMatcher;
pub use llm::LlmJobMatcher;

/// One ranked job with the evidence behind its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatch {
    pub job_id: String,
    pub score: u32,
    pub reasons: Vec<String>,
    pub concerns: Vec<String>,
    pub job: Job,
}

/// Ranked matches, best first, with the backend that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub matches: Vec<JobMatch>,
    pub scorer: String, // "keyword" | "llm"
}

impl MatchReport {
    pub fn job_ids(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.job_id.clone()).collect()
    }
}

/// Successful matcher outcomes. "No match" is an empty report, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Ranked(MatchReport),
    /// The profile holds no skills; nothing to score against.
    ProfileIncomplete,
}

/// Matching failed, as opposed to finding nothing.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Matching provider failed: {0}")]
    Provider(#[from] LlmError),

    #[error("Matching response rejected: {0}")]
    InvalidResponse(String),
}

/// The matcher trait. Implement this to swap backends without touching
/// the orchestrator, handlers, or callers.
#[async_trait]
pub trait JobMatcher: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn rank(
        &self,
        profile: &UserProfile,
        jobs: &[Job],
        top_n: usize,
    ) -> Result<MatchOutcome, MatchError>;
}
