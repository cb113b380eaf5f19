//! HTTP server for the practice clip library
//!
//! Routes:
//! - GET /api/health - Health check
//! - GET /api/dot-practice/prompts - All conversations
//! - GET /api/dot-practice/prompt/:id - One conversation
//! - GET /audio/{role}/{id}.mp3 - Pre-rendered clips (HEAD supported)

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
