//! Rule-based matching. Fast, deterministic, no LLM call.
//!
//! score = (required skills covered by the profile)
//!       + 1 if the profile location is contained in the job location
//!       + 1 if the profile preference is contained in the job type
//!
//! A required skill is covered when a profile skill appears in it as a whole
//! term: `node` covers `Node.js`, `java` does not cover `JavaScript`.

use async_trait::async_trait;

use crate::matching::{JobMatch, JobMatcher, MatchError, MatchOutcome, MatchReport};
use crate::models::job::Job;
use crate::models::profile::UserProfile;
use crate::profile::extract::contains_term;

/// Upper bound on results from `manual_job_matching`.
pub const MANUAL_TOP_N: usize = 5;

pub struct KeywordJobMatcher;

#[async_trait]
impl JobMatcher for KeywordJobMatcher {
    fn backend(&self) -> &'static str {
        "keyword"
    }

    async fn rank(
        &self,
        profile: &UserProfile,
        jobs: &[Job],
        top_n: usize,
    ) -> Result<MatchOutcome, MatchError> {
        Ok(match manual_job_matching(profile, jobs) {
            MatchOutcome::Ranked(mut report) => {
                report.matches.truncate(top_n);
                MatchOutcome::Ranked(report)
            }
            incomplete => incomplete,
        })
    }
}

/// Scores every job, drops zero scores, and returns the best `MANUAL_TOP_N`
/// ordered by score descending (ties keep corpus order).
pub fn manual_job_matching(profile: &UserProfile, jobs: &[Job]) -> MatchOutcome {
    if !profile.has_skills() {
        return MatchOutcome::ProfileIncomplete;
    }

    let mut scored: Vec<JobMatch> = jobs
        .iter()
        .filter_map(|job| {
            let scored = score_job(profile, job);
            (scored.score > 0).then_some(scored)
        })
        .collect();

    // sort_by is stable: equal scores stay in corpus order
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(MANUAL_TOP_N);

    MatchOutcome::Ranked(MatchReport {
        matches: scored,
        scorer: "keyword".to_string(),
    })
}

/// Scores a single job against the profile and explains the result.
pub fn score_job(profile: &UserProfile, job: &Job) -> JobMatch {
    let mut score = 0u32;
    let mut reasons = Vec::new();
    let mut concerns = Vec::new();

    for required in &job.skills_required {
        let covered = profile.skills.iter().any(|s| contains_term(required, s));
        if covered {
            score += 1;
            reasons.push(format!("Compétence demandée : {required}"));
        } else {
            concerns.push(format!("Compétence à acquérir : {required}"));
        }
    }

    if let Some(location) = non_blank(profile.location.as_deref()) {
        if job.location.to_lowercase().contains(&location.to_lowercase()) {
            score += 1;
            reasons.push(format!("Localisation : {}", job.location));
        } else {
            concerns.push(format!("Poste situé à {}", job.location));
        }
    }

    if let Some(preferences) = non_blank(profile.preferences.as_deref()) {
        if job.job_type.to_lowercase().contains(&preferences.to_lowercase()) {
            score += 1;
            reasons.push(format!("Type de contrat : {}", job.job_type));
        }
    }

    JobMatch {
        job_id: job.id.clone(),
        score,
        reasons,
        concerns,
        job: job.clone(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
