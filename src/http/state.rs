use crate::conversation::Catalog;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Service name reported by the health check
    pub service: String,
    /// Conversations served by the prompt routes
    pub catalog: Arc<Catalog>,
    /// Root of the clip library served under `/audio`
    pub clips_path: PathBuf,
}

impl AppState {
    pub fn new(service: impl Into<String>, catalog: Arc<Catalog>, clips_path: impl Into<PathBuf>) -> Self {
        Self {
            service: service.into(),
            catalog,
            clips_path: clips_path.into(),
        }
    }
}
