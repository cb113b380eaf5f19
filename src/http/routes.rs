use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let clips = ServeDir::new(&state.clips_path);

    Router::new()
        // Health check
        .route("/api/health", get(handlers::health_check))
        // Conversation data
        .route("/api/dot-practice/prompts", get(handlers::list_prompts))
        .route("/api/dot-practice/prompt/:id", get(handlers::get_prompt))
        // Pre-rendered clips
        .nest_service("/audio", clips)
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
