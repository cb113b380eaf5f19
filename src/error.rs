use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Stage at which a playback deadline elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStage {
    /// Source assigned, waiting for the output to become ready
    Loading,
    /// Output playing, waiting for the natural end
    Playing,
}

impl fmt::Display for TimeoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutStage::Loading => f.write_str("loading"),
            TimeoutStage::Playing => f.write_str("playing"),
        }
    }
}

/// Failure of a segment or conversation playback
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("audio fetch failed: {0}")]
    FetchFailed(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("audio timeout while {stage} (after {}ms)", .after.as_millis())]
    Timeout { stage: TimeoutStage, after: Duration },
    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),
    #[error("playback interrupted by a newer segment")]
    Interrupted,
    #[error("conversation {0} not found")]
    UnknownConversation(u32),
}

/// Tag of a [`PlaybackError`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FetchFailed,
    Playback,
    Timeout,
    ConfigurationMissing,
    Interrupted,
    UnknownConversation,
}

impl PlaybackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlaybackError::FetchFailed(_) => ErrorKind::FetchFailed,
            PlaybackError::Playback(_) => ErrorKind::Playback,
            PlaybackError::Timeout { .. } => ErrorKind::Timeout,
            PlaybackError::ConfigurationMissing(_) => ErrorKind::ConfigurationMissing,
            PlaybackError::Interrupted => ErrorKind::Interrupted,
            PlaybackError::UnknownConversation(_) => ErrorKind::UnknownConversation,
        }
    }
}

impl From<reqwest::Error> for PlaybackError {
    fn from(err: reqwest::Error) -> Self {
        PlaybackError::FetchFailed(err.to_string())
    }
}
