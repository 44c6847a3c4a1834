//! Turn Orchestrator: runs one user message through
//! classify → execute → compose and commits the conversation state at the end.
//!
//! Every path reaches `Done` with a well-formed payload. Provider failures are
//! soft: they route through `Failed` and surface as `degraded: true`.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chat::composer::{compose, ComposeInput, Executed, TurnPayload};
use crate::chat::intent::{classify, ClassifiedIntent, Intent};
use crate::corpus::filter::filter_jobs;
use crate::corpus::JobCorpus;
use crate::llm_client::CompletionProvider;
use crate::matching::{JobMatcher, MatchOutcome};
use crate::models::conversation::ChatMessage;
use crate::models::job::Job;
use crate::models::profile::UserProfile;
use crate::profile::extract::extract_profile;
use crate::profile::store::ProfileStore;

// ────────────────────────────────────────────────────────────────────────────
// Stage machine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Idle,
    Classifying,
    Executing,
    Composing,
    Done,
    Failed,
}

impl TurnStage {
    pub fn can_advance_to(self, next: TurnStage) -> bool {
        use TurnStage::*;
        matches!(
            (self, next),
            (Idle, Classifying)
                | (Classifying, Executing)
                | (Classifying, Failed)
                | (Executing, Composing)
                | (Executing, Failed)
                | (Failed, Composing)
                | (Composing, Done)
        )
    }
}

#[derive(Debug, Error)]
#[error("illegal turn transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: TurnStage,
    pub to: TurnStage,
}

/// Tracks one turn's stage and remembers whether `Failed` was visited.
#[derive(Debug)]
pub struct StageTracker {
    stage: TurnStage,
    failed: bool,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self {
            stage: TurnStage::Idle,
            failed: false,
        }
    }
}

impl StageTracker {
    pub fn stage(&self) -> TurnStage {
        self.stage
    }

    pub fn visited_failed(&self) -> bool {
        self.failed
    }

    pub fn advance(&mut self, next: TurnStage) -> Result<(), IllegalTransition> {
        if !self.stage.can_advance_to(next) {
            return Err(IllegalTransition {
                from: self.stage,
                to: next,
            });
        }
        self.failed |= next == TurnStage::Failed;
        self.stage = next;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Turn
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub conversation_id: String,
    pub history: Vec<ChatMessage>,
    pub message: String,
    /// Profile persisted by the client, merged in as a delta.
    pub client_profile: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub conversation_id: String,
    pub intent: Intent,
    pub payload: TurnPayload,
    pub profile: UserProfile,
    pub degraded: bool,
}

pub struct TurnEngine {
    corpus: Arc<JobCorpus>,
    provider: Arc<dyn CompletionProvider>,
    matcher: Arc<dyn JobMatcher>,
    store: Arc<dyn ProfileStore>,
    top_n: usize,
}

impl TurnEngine {
    pub fn new(
        corpus: Arc<JobCorpus>,
        provider: Arc<dyn CompletionProvider>,
        matcher: Arc<dyn JobMatcher>,
        store: Arc<dyn ProfileStore>,
        top_n: usize,
    ) -> Self {
        Self {
            corpus,
            provider,
            matcher,
            store,
            top_n,
        }
    }

    /// Handles one message. The conversation lock is held for the whole turn;
    /// profile and last-shown list are written only once the turn is `Done`,
    /// so a dropped turn commits nothing.
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnResponse, IllegalTransition> {
        let session = self.store.session(&request.conversation_id).await;
        let mut conversation = session.lock().await;

        let mut profile = conversation.profile.clone();
        if let Some(client_profile) = request.client_profile {
            profile.merge(client_profile.into());
        }
        let learned = extract_profile(&request.message);
        if !learned.is_empty() {
            debug!(
                conversation_id = %request.conversation_id,
                skills = ?learned.skills,
                "Profile learned from message"
            );
        }
        profile.merge(learned);

        let mut tracker = StageTracker::default();
        tracker.advance(TurnStage::Classifying)?;

        let classified = match classify(self.provider.as_ref(), &request.history, &request.message).await {
            Ok(classified) => classified,
            Err(e) => {
                warn!("Classification unavailable: {e}; falling back to general_chat");
                tracker.advance(TurnStage::Failed)?;
                ClassifiedIntent::general_chat()
            }
        };

        let executed = if tracker.stage() == TurnStage::Failed {
            Executed::Nothing
        } else {
            tracker.advance(TurnStage::Executing)?;
            let executed = self
                .execute(&classified, &profile, &conversation.last_shown)
                .await;
            if executed == Executed::MatchingFailed {
                tracker.advance(TurnStage::Failed)?;
            }
            executed
        };

        tracker.advance(TurnStage::Composing)?;
        let composed = compose(
            self.provider.as_ref(),
            executed,
            ComposeInput {
                intent: classified.intent,
                message: &request.message,
                history: &request.history,
                profile: &profile,
            },
        )
        .await;
        tracker.advance(TurnStage::Done)?;

        conversation.commit(profile.clone(), composed.payload.shown_job_ids());

        let degraded = tracker.visited_failed() || composed.fell_back;
        info!(
            conversation_id = %request.conversation_id,
            intent = classified.intent.as_str(),
            degraded,
            "Turn completed"
        );

        Ok(TurnResponse {
            conversation_id: request.conversation_id,
            intent: classified.intent,
            payload: composed.payload,
            profile,
            degraded,
        })
    }

    async fn execute(
        &self,
        classified: &ClassifiedIntent,
        profile: &UserProfile,
        last_shown: &[String],
    ) -> Executed {
        let filters = &classified.filters;
        match classified.intent {
            Intent::ShowAllJobs => Executed::Jobs(self.corpus.all().to_vec()),
            Intent::SearchJobs => Executed::Jobs(
                filter_jobs(self.corpus.all(), &filters.search)
                    .into_iter()
                    .cloned()
                    .collect(),
            ),
            Intent::JobRecommendation => self.recommend(profile).await,
            Intent::JobDetails => self
                .resolve_job(filters.position_in_list, filters.job_id.as_deref(), last_shown)
                .cloned()
                .map_or(Executed::NotFound, Executed::Job),
            Intent::GeneralChat => Executed::Nothing,
        }
    }

    async fn recommend(&self, profile: &UserProfile) -> Executed {
        if !profile.has_skills() {
            return Executed::ProfileIncomplete;
        }
        match self.matcher.rank(profile, self.corpus.all(), self.top_n).await {
            Ok(MatchOutcome::Ranked(report)) => Executed::Matches(report),
            Ok(MatchOutcome::ProfileIncomplete) => Executed::ProfileIncomplete,
            Err(e) => {
                warn!("Matching failed ({}): {e}", self.matcher.backend());
                Executed::MatchingFailed
            }
        }
    }

    /// Position in the last shown list first, then the job id.
    fn resolve_job(
        &self,
        position: Option<usize>,
        job_id: Option<&str>,
        last_shown: &[String],
    ) -> Option<&Job> {
        position
            .and_then(|p| p.checked_sub(1))
            .and_then(|idx| last_shown.get(idx))
            .and_then(|id| self.corpus.get(id))
            .or_else(|| job_id.and_then(|id| self.corpus.get(id)))
    }
}
