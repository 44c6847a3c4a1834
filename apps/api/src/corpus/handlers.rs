use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::corpus::filter::{filter_jobs, JobFilters};
use crate::errors::AppError;
use crate::models::job::Job;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
    pub count: usize,
}

impl JobListResponse {
    fn from_refs<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        let jobs: Vec<Job> = jobs.into_iter().cloned().collect();
        let count = jobs.len();
        Self { jobs, count }
    }
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job: Job,
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    Json(JobListResponse::from_refs(state.corpus.all()))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, AppError> {
    let job = state
        .corpus
        .get(&id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(Json(JobResponse { job }))
}

/// POST /api/v1/jobs/search
/// An empty result is a 200 with `count: 0`.
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    Json(filters): Json<JobFilters>,
) -> Json<JobListResponse> {
    Json(JobListResponse::from_refs(filter_jobs(state.corpus.all(), &filters)))
}
