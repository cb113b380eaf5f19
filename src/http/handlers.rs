use super::state::AppState;
use crate::conversation::Conversation;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::warn;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct PromptListResponse<'a> {
    pub success: bool,
    pub total: usize,
    pub prompts: Vec<&'a Conversation>,
}

#[derive(Debug, Serialize)]
pub struct PromptResponse<'a> {
    pub success: bool,
    pub prompt: &'a Conversation,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            service: state.service.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
}

/// GET /api/dot-practice/prompts
pub async fn list_prompts(State(state): State<AppState>) -> impl IntoResponse {
    let prompts: Vec<&Conversation> = state.catalog.iter().collect();

    (
        StatusCode::OK,
        Json(PromptListResponse {
            success: true,
            total: prompts.len(),
            prompts,
        }),
    )
        .into_response()
}

/// GET /api/dot-practice/prompt/:id
pub async fn get_prompt(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> impl IntoResponse {
    match state.catalog.get(id) {
        Some(prompt) => (
            StatusCode::OK,
            Json(PromptResponse {
                success: true,
                prompt,
            }),
        )
            .into_response(),
        None => {
            warn!("Prompt {} not found", id);
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    success: false,
                    message: "Prompt not found".to_string(),
                }),
            )
                .into_response()
        }
    }
}
