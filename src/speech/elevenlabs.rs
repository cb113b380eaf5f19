use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, error, info};

use super::pacing::Pacing;
use super::{check_response, SpeechProvider};
use crate::config::SynthesisConfig;
use crate::error::PlaybackError;

/// Voice tuning sent with every request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: String,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

/// ElevenLabs text-to-speech
pub struct ElevenLabsProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    voice_id: String,
    model_id: String,
    voice_settings: VoiceSettings,
    pacing: Pacing,
}

impl ElevenLabsProvider {
    /// Build from configuration; API key and voice id are required
    pub fn from_config(config: &SynthesisConfig, client: reqwest::Client) -> Result<Self, PlaybackError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(PlaybackError::ConfigurationMissing("ElevenLabs API key"))?;
        let voice_id = config
            .voice_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or(PlaybackError::ConfigurationMissing("ElevenLabs voice id"))?;

        info!("ElevenLabs provider: voice {}, model {}", voice_id, config.model_id);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            voice_id,
            model_id: config.model_id.clone(),
            voice_settings: VoiceSettings {
                stability: config.stability,
                similarity_boost: config.similarity_boost,
                style: config.style,
                use_speaker_boost: config.use_speaker_boost,
            },
            pacing: Pacing::Slow,
        })
    }

    /// Override the pacing transform (slow by default)
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/text-to-speech/{}", self.base_url, self.voice_id)
    }
}

#[async_trait::async_trait]
impl SpeechProvider for ElevenLabsProvider {
    async fn synthesize(&self, text: &str) -> Result<Bytes, PlaybackError> {
        let body = SpeechRequest {
            text: self.pacing.apply(text),
            model_id: &self.model_id,
            voice_settings: &self.voice_settings,
        };

        debug!("ElevenLabs request: {:?}", body.text);
        info!(
            "ElevenLabs: generating speech for \"{}\"",
            text.chars().take(50).collect::<String>()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(ACCEPT, "audio/mpeg")
            .header(CONTENT_TYPE, "application/json")
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("ElevenLabs request failed: {}", e);
                PlaybackError::from(e)
            })?;

        let response = check_response("ElevenLabs", response).await.map_err(|e| {
            error!("{}", e);
            e
        })?;

        let audio = response.bytes().await?;
        info!("Generated audio: {} bytes", audio.len());

        Ok(audio)
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}
