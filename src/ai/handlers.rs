use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AskAiRequest {
    #[serde(default)]
    pub message: String,
}

pub fn ai_routes() -> Router<AppState> {
    Router::new().route("/ask-ai", post(ask_ai))
}

/// Relays the message to the AI backend and answers with its plain text.
#[instrument(skip(state, payload))]
pub async fn ask_ai(
    State(state): State<AppState>,
    payload: Result<Json<AskAiRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let Json(payload) = payload?;
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::validation("Message is required"));
    }

    let answer = state.ai.generate(message).await.map_err(ApiError::Upstream)?;
    info!(prompt_chars = message.len(), answer_chars = answer.len(), "ai answered");
    Ok(answer)
}
