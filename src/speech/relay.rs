use bytes::Bytes;
use reqwest::header::ACCEPT;
use serde::Serialize;
use tracing::{error, info};

use super::pacing::Pacing;
use super::{check_response, SpeechProvider};
use crate::config::SynthesisConfig;
use crate::error::PlaybackError;

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    text: String,
    lang: &'a str,
    slow: bool,
}

/// Speech through the practice backend's TTS relay
pub struct RelayProvider {
    client: reqwest::Client,
    api_url: String,
    lang: String,
    slow: bool,
}

impl RelayProvider {
    pub fn from_config(config: &SynthesisConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            api_url: config.relay_url.trim_end_matches('/').to_string(),
            lang: config.lang.clone(),
            slow: config.slow,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/tts/generate", self.api_url)
    }
}

#[async_trait::async_trait]
impl SpeechProvider for RelayProvider {
    async fn synthesize(&self, text: &str) -> Result<Bytes, PlaybackError> {
        let body = RelayRequest {
            text: Pacing::Light.apply(text),
            lang: &self.lang,
            slow: self.slow,
        };

        info!(
            "Relay TTS ({}, slow={}): \"{}\"",
            self.lang,
            self.slow,
            text.chars().take(50).collect::<String>()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let response = check_response("Relay TTS", response).await.map_err(|e| {
            error!("{}", e);
            e
        })?;

        let audio = response.bytes().await?;
        info!("Generated audio: {} bytes", audio.len());

        Ok(audio)
    }

    fn name(&self) -> &str {
        "relay"
    }
}
