// Headless audio output
//
// Loads a clip (fetching it over HTTP for URL sources), probes its container
// to learn the duration, and then behaves like a media element: `play` runs a
// clock for the remaining duration and reports `Ended` when it elapses.
// Nothing is sent to a sound device, which makes this output usable on
// servers and in tests while keeping real load and timing behaviour.

use anyhow::{Context, Result};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::clip::ClipInfo;
use super::output::{AudioOutput, AudioSource, OutputEvent};

const EVENT_BUFFER: usize = 16;

pub struct DecodedOutput {
    client: reqwest::Client,
    /// Sender for the current source's event channel
    events: Option<mpsc::Sender<OutputEvent>>,
    /// Filled by the loader once the current source is probed
    clip: Arc<Mutex<Option<ClipInfo>>>,
    loader: Option<JoinHandle<()>>,
    clock: Option<JoinHandle<()>>,
    position: Duration,
    playing_since: Option<Instant>,
}

impl DecodedOutput {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            events: None,
            clip: Arc::new(Mutex::new(None)),
            loader: None,
            clock: None,
            position: Duration::ZERO,
            playing_since: None,
        }
    }

    /// Current playback position
    pub fn position(&self) -> Duration {
        match self.playing_since {
            Some(since) => self.position + since.elapsed(),
            None => self.position,
        }
    }

    fn is_playing(&self) -> bool {
        self.clock.as_ref().is_some_and(|clock| !clock.is_finished())
    }

    fn stop_tasks(&mut self) {
        if let Some(loader) = self.loader.take() {
            loader.abort();
        }
        if let Some(clock) = self.clock.take() {
            clock.abort();
        }
        self.playing_since = None;
    }

    async fn fetch(client: &reqwest::Client, source: AudioSource) -> Result<(Bytes, Option<String>)> {
        match source {
            AudioSource::Memory { bytes, mime } => Ok((bytes, Some(mime))),
            AudioSource::Url(url) => {
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch {}", url))?
                    .error_for_status()
                    .with_context(|| format!("Clip not available: {}", url))?;

                let bytes = response
                    .bytes()
                    .await
                    .context("Failed to read clip body")?;

                // Container detection works from the stream itself; a
                // server-provided content type may not match the payload.
                Ok((bytes, None))
            }
        }
    }

    async fn load_clip(client: reqwest::Client, source: AudioSource) -> Result<ClipInfo> {
        let (bytes, mime) = Self::fetch(&client, source).await?;

        tokio::task::spawn_blocking(move || ClipInfo::probe(bytes, mime.as_deref()))
            .await
            .context("Clip probe task failed")?
    }
}

#[async_trait::async_trait]
impl AudioOutput for DecodedOutput {
    async fn load(&mut self, source: AudioSource) -> Result<mpsc::Receiver<OutputEvent>> {
        self.stop_tasks();
        self.position = Duration::ZERO;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        // Fresh slot per source so an aborted loader cannot publish a stale clip
        let slot = Arc::new(Mutex::new(None));
        self.clip = Arc::clone(&slot);

        debug!("Loading {}", source.describe());

        let client = self.client.clone();
        let loader_tx = tx.clone();
        self.loader = Some(tokio::spawn(async move {
            match Self::load_clip(client, source).await {
                Ok(info) => {
                    info!(
                        "Clip ready: {:.2}s, {}Hz, {} channels",
                        info.duration.as_secs_f64(),
                        info.sample_rate,
                        info.channels
                    );
                    *slot.lock().await = Some(info);
                    let _ = loader_tx.send(OutputEvent::CanPlayThrough).await;
                }
                Err(e) => {
                    warn!("Clip failed to load: {:#}", e);
                    let _ = loader_tx.send(OutputEvent::Error(format!("{:#}", e))).await;
                }
            }
        }));

        self.events = Some(tx);

        Ok(rx)
    }

    async fn play(&mut self) -> Result<()> {
        if self.is_playing() {
            return Ok(());
        }

        let info = self
            .clip
            .lock()
            .await
            .clone()
            .context("No clip loaded")?;
        let tx = self.events.clone().context("No source assigned")?;

        let remaining = info.duration.saturating_sub(self.position);
        self.playing_since = Some(Instant::now());
        self.clock = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let _ = tx.send(OutputEvent::Ended).await;
        }));

        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        if let Some(clock) = self.clock.take() {
            clock.abort();
        }
        if let Some(since) = self.playing_since.take() {
            self.position += since.elapsed();
        }
        Ok(())
    }

    async fn reset(&mut self) -> Result<()> {
        let was_playing = self.is_playing();
        self.pause().await?;
        self.position = Duration::ZERO;
        if was_playing {
            self.play().await?;
        }
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        self.stop_tasks();
        self.events = None;
        self.clip = Arc::new(Mutex::new(None));
        self.position = Duration::ZERO;
        Ok(())
    }

    fn name(&self) -> &str {
        "decoded"
    }
}

impl Drop for DecodedOutput {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}
