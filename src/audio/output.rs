use anyhow::Result;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Audio handed to an output
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Clip held in memory (freshly synthesized or preloaded)
    Memory {
        /// Encoded audio bytes
        bytes: Bytes,
        /// MIME type of the encoding, e.g. `audio/mpeg`
        mime: String,
    },
    /// Clip the output fetches itself
    Url(String),
}

impl AudioSource {
    pub fn mpeg(bytes: Bytes) -> Self {
        AudioSource::Memory {
            bytes,
            mime: "audio/mpeg".to_string(),
        }
    }

    /// Short description for logging
    pub fn describe(&self) -> String {
        match self {
            AudioSource::Memory { bytes, mime } => format!("{} bytes of {}", bytes.len(), mime),
            AudioSource::Url(url) => url.clone(),
        }
    }
}

/// Event reported by an output for its current source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Enough data to start, but may stall before the end
    CanPlay,
    /// Whole clip is playable without interruption
    CanPlayThrough,
    /// Data stopped arriving; playback may resume on its own
    Stalled,
    /// Playback reached the end of the clip
    Ended,
    /// Source could not be loaded or played
    Error(String),
}

/// A single reusable audio output
///
/// Implementations:
/// - `DecodedOutput`: headless, probes the clip and runs a playback clock
/// - Test doubles scripting events directly
#[async_trait::async_trait]
pub trait AudioOutput: Send + Sync {
    /// Assign a new source and start loading it
    ///
    /// Events for this source arrive on the returned receiver. The channel
    /// closes when the source is replaced or released, so a receiver never
    /// sees events that belong to a later source.
    async fn load(&mut self, source: AudioSource) -> Result<mpsc::Receiver<OutputEvent>>;

    /// Start or resume playback of the loaded source
    async fn play(&mut self) -> Result<()>;

    /// Pause playback, keeping the current position
    async fn pause(&mut self) -> Result<()>;

    /// Move the playback position back to the start
    async fn reset(&mut self) -> Result<()>;

    /// Drop the current source and any buffer held for it
    async fn release(&mut self) -> Result<()>;

    /// Get output name for logging
    fn name(&self) -> &str;
}
