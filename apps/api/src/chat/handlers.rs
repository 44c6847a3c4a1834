use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::chat::engine::{TurnRequest, TurnResponse};
use crate::errors::AppError;
use crate::llm_client::{Completion, LlmError};
use crate::models::conversation::ChatMessage;
use crate::models::profile::UserProfile;
use crate::state::AppState;

const PLAIN_CHAT_MAX_TOKENS: u32 = 200;
const PLAIN_CHAT_TEMPERATURE: f32 = 0.7;

pub const MODEL_ERROR_ANSWER: &str = "Erreur du modèle.";
pub const EMPTY_ANSWER: &str = "Pas de réponse";
pub const UNAVAILABLE_ANSWER: &str = "Le bot est indisponible.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// POST /api/v1/chat
/// Plain pass-through completion. Provider failures become fixed answers, never a 5xx.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt must not be empty".to_string()));
    }

    let answer = match state
        .llm
        .complete(Completion::new(&req.prompt, PLAIN_CHAT_MAX_TOKENS, PLAIN_CHAT_TEMPERATURE))
        .await
    {
        Ok(answer) => answer,
        Err(LlmError::EmptyContent) => EMPTY_ANSWER.to_string(),
        Err(e @ LlmError::Api { .. }) => {
            warn!("Plain chat rejected by provider: {e}");
            MODEL_ERROR_ANSWER.to_string()
        }
        Err(e) => {
            warn!("Plain chat provider unavailable: {e}");
            UNAVAILABLE_ANSWER.to_string()
        }
    };
    Ok(Json(ChatResponse { answer }))
}

#[derive(Debug, Deserialize)]
pub struct TurnHttpRequest {
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub conversation: Vec<ChatMessage>,
    pub message: String,
    #[serde(alias = "userProfile")]
    pub user_profile: Option<UserProfile>,
}

/// POST /api/v1/chat/turn
pub async fn handle_turn(
    State(state): State<AppState>,
    Json(req): Json<TurnHttpRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let conversation_id = req
        .conversation_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let response = state
        .engine
        .handle_turn(TurnRequest {
            conversation_id,
            history: req.conversation,
            message: req.message,
            client_profile: req.user_profile,
        })
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/conversations/:id/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    state
        .profiles
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Conversation {id} not found")))
}

/// DELETE /api/v1/conversations/:id
pub async fn handle_end_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.profiles.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Conversation {id} not found")))
    }
}
