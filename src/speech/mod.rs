//! Remote text-to-speech providers
//!
//! - ElevenLabs: direct API, authenticated with `xi-api-key`
//! - Relay: the practice backend's `/api/tts/generate` endpoint
//!
//! Providers apply their own pacing transform before sending text.

mod elevenlabs;
pub mod pacing;
mod relay;
mod render;

use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SynthesisConfig;
use crate::error::PlaybackError;

pub use elevenlabs::{ElevenLabsProvider, VoiceSettings};
pub use pacing::{add_natural_pauses, Pacing};
pub use relay::RelayProvider;
pub use render::{synthesize_batch, BatchAudio, ClipRenderer, RenderReport};

/// Text-to-speech provider
#[async_trait::async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize `text`, returning encoded audio (MP3)
    async fn synthesize(&self, text: &str) -> Result<Bytes, PlaybackError>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Provider selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    ElevenLabs,
    Relay,
}

/// Speech provider factory
pub struct SpeechProviderFactory;

impl SpeechProviderFactory {
    pub fn create(config: &SynthesisConfig) -> Result<Arc<dyn SpeechProvider>, PlaybackError> {
        let client = http_client(Duration::from_secs(config.request_timeout_secs))?;

        match config.provider {
            ProviderKind::ElevenLabs => Ok(Arc::new(ElevenLabsProvider::from_config(config, client)?)),
            ProviderKind::Relay => Ok(Arc::new(RelayProvider::from_config(config, client))),
        }
    }
}

/// HTTP client with a request timeout
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, PlaybackError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(PlaybackError::from)
}

/// Turn a non-success provider response into `FetchFailed` with status and body
pub(crate) async fn check_response(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, PlaybackError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(PlaybackError::FetchFailed(format!(
        "{} API error: {} - {}",
        provider,
        status.as_u16(),
        body
    )))
}
