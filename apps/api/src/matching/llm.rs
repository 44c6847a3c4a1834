//! Semantic matching via the provider. Scores are bounded to 0–100.
//!
//! The reply is validated before any field is trusted: schema mismatch, unknown
//! job ids only, or provider failure all surface as `MatchError`, never as an
//! empty list.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::llm_client::prompts::{fill_template, JSON_ONLY_SYSTEM};
use crate::llm_client::{complete_json, Completion, CompletionProvider};
use crate::matching::prompts::MATCH_PROMPT_TEMPLATE;
use crate::matching::{JobMatch, JobMatcher, MatchError, MatchOutcome, MatchReport};
use crate::models::job::Job;
use crate::models::profile::UserProfile;

const MATCH_MAX_TOKENS: u32 = 1500;
const MATCH_TEMPERATURE: f32 = 0.3;
const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Deserialize)]
struct RawMatches {
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    job_id: String,
    score: f64,
    #[serde(default)]
    reasons: Vec<String>,
    #[serde(default)]
    concerns: Vec<String>,
}

pub struct LlmJobMatcher {
    provider: Arc<dyn CompletionProvider>,
}

impl LlmJobMatcher {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl JobMatcher for LlmJobMatcher {
    fn backend(&self) -> &'static str {
        "llm"
    }

    async fn rank(
        &self,
        profile: &UserProfile,
        jobs: &[Job],
        top_n: usize,
    ) -> Result<MatchOutcome, MatchError> {
        if !profile.has_skills() {
            return Ok(MatchOutcome::ProfileIncomplete);
        }
        if jobs.is_empty() || top_n == 0 {
            return Ok(MatchOutcome::Ranked(MatchReport {
                matches: vec![],
                scorer: self.backend().to_string(),
            }));
        }

        let prompt = build_match_prompt(profile, jobs, top_n)?;
        let value = complete_json(
            self.provider.as_ref(),
            Completion::new(&prompt, MATCH_MAX_TOKENS, MATCH_TEMPERATURE).with_system(JSON_ONLY_SYSTEM),
        )
        .await?;

        let raw: RawMatches = serde_json::from_value(value)
            .map_err(|e| MatchError::InvalidResponse(format!("schema mismatch: {e}")))?;

        let matches = validate_matches(raw.matches, jobs, top_n)?;
        info!("LLM matcher ranked {} jobs (top_n={top_n})", matches.len());

        Ok(MatchOutcome::Ranked(MatchReport {
            matches,
            scorer: self.backend().to_string(),
        }))
    }
}

fn build_match_prompt(profile: &UserProfile, jobs: &[Job], top_n: usize) -> Result<String, MatchError> {
    let profile_json = serde_json::to_string_pretty(profile)
        .map_err(|e| MatchError::InvalidResponse(format!("failed to serialize profile: {e}")))?;

    let jobs_json = serde_json::to_string_pretty(
        &jobs
            .iter()
            .map(|job| {
                serde_json::json!({
                    "job_id": job.id,
                    "title": job.title,
                    "company": job.company,
                    "location": job.location,
                    "type": job.job_type,
                    "skills_required": job.skills_required,
                    "education_level": job.education_level,
                    "description": job.description,
                })
            })
            .collect::<Vec<_>>(),
    )
    .map_err(|e| MatchError::InvalidResponse(format!("failed to serialize jobs: {e}")))?;

    Ok(fill_template(
        MATCH_PROMPT_TEMPLATE,
        &[
            ("profile_json", &profile_json),
            ("jobs_json", &jobs_json),
            ("top_n", &top_n.to_string()),
        ],
    ))
}

/// Drops unknown or repeated ids, clamps scores, sorts best first, truncates.
fn validate_matches(raw: Vec<RawMatch>, jobs: &[Job], top_n: usize) -> Result<Vec<JobMatch>, MatchError> {
    let returned = raw.len();
    let mut seen = HashSet::new();

    let mut matches: Vec<JobMatch> = raw
        .into_iter()
        .filter_map(|m| {
            let id = m.job_id.trim();
            let Some(job) = jobs.iter().find(|j| j.id == id) else {
                warn!("LLM matcher returned unknown job_id '{id}', dropped");
                return None;
            };
            if !seen.insert(job.id.clone()) {
                return None;
            }
            Some(JobMatch {
                job_id: job.id.clone(),
                score: clamp_score(m.score),
                reasons: m.reasons,
                concerns: m.concerns,
                job: job.clone(),
            })
        })
        .collect();

    if returned > 0 && matches.is_empty() {
        return Err(MatchError::InvalidResponse(format!(
            "all {returned} returned matches referenced unknown jobs"
        )));
    }

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches.truncate(top_n);
    Ok(matches)
}

fn clamp_score(score: f64) -> u32 {
    if score.is_nan() {
        return 0;
    }
    score.clamp(0.0, MAX_SCORE).round() as u32
}
