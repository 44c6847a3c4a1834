use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::matching::{MatchOutcome, MatchReport};
use crate::models::profile::UserProfile;
use crate::state::AppState;

/// Hard ceiling on `top_n` from callers.
const MAX_TOP_N: usize = 20;

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    #[serde(alias = "userProfile")]
    pub user_profile: UserProfile,
    #[serde(alias = "topN")]
    pub top_n: Option<usize>,
}

/// POST /api/v1/jobs/match
/// 422 when the profile has no skills; 502 when the matcher failed.
pub async fn handle_match_jobs(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchReport>, AppError> {
    let top_n = req.top_n.unwrap_or(state.config.match_top_n);
    if top_n == 0 || top_n > MAX_TOP_N {
        return Err(AppError::Validation(format!(
            "top_n must be between 1 and {MAX_TOP_N}"
        )));
    }

    // Same normalization as a turn: trimmed, lowercase skills.
    let mut profile = UserProfile::default();
    profile.merge(req.user_profile.into());

    match state.matcher.rank(&profile, state.corpus.all(), top_n).await? {
        MatchOutcome::Ranked(report) => Ok(Json(report)),
        MatchOutcome::ProfileIncomplete => Err(AppError::UnprocessableEntity(
            "user_profile.skills must contain at least one skill".to_string(),
        )),
    }
}
