use bytes::Bytes;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::audio::AudioSource;
use crate::config::Config;
use crate::conversation::{Role, Segment};
use crate::error::PlaybackError;
use crate::speech::{http_client, SpeechProviderFactory, SpeechProvider};

/// Number of conversations `preload` warms
pub const PRELOAD_LIMIT: usize = 5;

/// Turns a segment into something an audio output can load
#[async_trait::async_trait]
pub trait SegmentResolver: Send + Sync {
    /// Resolve the segment's audio
    async fn resolve(&self, segment: &Segment) -> Result<AudioSource, PlaybackError>;

    /// Deadline for a resolved clip to load and finish playing
    fn deadline(&self) -> Duration;

    /// Get resolver name for logging
    fn name(&self) -> &str;
}

/// Where segment audio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Generated at play time by a speech provider
    Synthesis,
    /// Pre-rendered clips at `/audio/{role}/{id}.mp3`
    #[default]
    Static,
}

/// Segment resolver factory
pub struct SegmentResolverFactory;

impl SegmentResolverFactory {
    pub fn create(kind: SourceKind, config: &Config) -> Result<Arc<dyn SegmentResolver>, PlaybackError> {
        match kind {
            SourceKind::Synthesis => {
                let provider = SpeechProviderFactory::create(&config.synthesis)?;
                Ok(Arc::new(
                    SynthesisResolver::new(provider)
                        .with_deadline(Duration::from_secs(config.playback.synthesis_timeout_secs)),
                ))
            }
            SourceKind::Static => {
                let client = http_client(Duration::from_secs(config.synthesis.request_timeout_secs))?;
                Ok(Arc::new(
                    StaticClipResolver::new(client, &config.audio.base_url)
                        .with_deadline(Duration::from_secs(config.playback.static_timeout_secs)),
                ))
            }
        }
    }
}

/// Synthesizes each segment's text at play time
pub struct SynthesisResolver {
    provider: Arc<dyn SpeechProvider>,
    deadline: Duration,
}

impl SynthesisResolver {
    pub fn new(provider: Arc<dyn SpeechProvider>) -> Self {
        Self {
            provider,
            deadline: Duration::from_secs(20),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

#[async_trait::async_trait]
impl SegmentResolver for SynthesisResolver {
    async fn resolve(&self, segment: &Segment) -> Result<AudioSource, PlaybackError> {
        let audio = self.provider.synthesize(&segment.text).await?;
        Ok(AudioSource::mpeg(audio))
    }

    fn deadline(&self) -> Duration {
        self.deadline
    }

    fn name(&self) -> &str {
        "synthesis"
    }
}

/// Plays pre-rendered clips from a static file server
pub struct StaticClipResolver {
    client: reqwest::Client,
    base_url: String,
    deadline: Duration,
    /// Clips fetched ahead of time by `preload`
    cache: RwLock<HashMap<(u32, Role), Bytes>>,
}

impl StaticClipResolver {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            deadline: Duration::from_secs(15),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// `{base}/audio/{role}/{id}.mp3`
    pub fn clip_url(&self, question_id: u32, role: Role) -> String {
        format!("{}/audio/{}/{}.mp3", self.base_url, role, question_id)
    }

    /// Whether the clip exists; false on a non-success status or network error
    pub async fn check_exists(&self, question_id: u32, role: Role) -> bool {
        let url = self.clip_url(question_id, role);
        match self.client.head(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                false
            }
        }
    }

    /// Fetch both clips of the first few conversations into memory
    ///
    /// Replaces whatever an earlier call cached. Returns the number of clips
    /// cached. Failures are logged and skipped.
    pub async fn preload(&self, question_ids: &[u32]) -> usize {
        self.cache.write().await.clear();

        info!(
            "Preloading audio for {} of {} questions",
            question_ids.len().min(PRELOAD_LIMIT),
            question_ids.len()
        );

        let mut cached = 0;
        for &id in question_ids.iter().take(PRELOAD_LIMIT) {
            for role in [Role::Officer, Role::Driver] {
                match self.fetch(id, role).await {
                    Ok(bytes) => {
                        self.cache.write().await.insert((id, role), bytes);
                        cached += 1;
                    }
                    Err(e) => warn!("Failed to preload {} clip {}: {}", role, id, e),
                }
            }
        }

        info!("Preloaded {} clips", cached);
        cached
    }

    pub async fn is_cached(&self, question_id: u32, role: Role) -> bool {
        self.cache.read().await.contains_key(&(question_id, role))
    }

    async fn fetch(&self, question_id: u32, role: Role) -> Result<Bytes, PlaybackError> {
        let response = self
            .client
            .get(self.clip_url(question_id, role))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?)
    }
}

#[async_trait::async_trait]
impl SegmentResolver for StaticClipResolver {
    async fn resolve(&self, segment: &Segment) -> Result<AudioSource, PlaybackError> {
        if let Some(bytes) = self.cache.read().await.get(&(segment.question_id, segment.role)) {
            debug!("Using preloaded {} clip {}", segment.role, segment.question_id);
            return Ok(AudioSource::mpeg(bytes.clone()));
        }

        Ok(AudioSource::Url(self.clip_url(segment.question_id, segment.role)))
    }

    fn deadline(&self) -> Duration {
        self.deadline
    }

    fn name(&self) -> &str {
        "static"
    }
}
