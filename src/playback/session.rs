use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::conversation::Role;
use crate::error::ErrorKind;

/// Progress of one segment's playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum PlaybackState {
    /// No segment in flight
    Idle,
    /// Obtaining audio (synthesis request or clip lookup)
    Resolving,
    /// Source assigned to the output, waiting for it to become ready
    Loading,
    /// Output playing
    Playing,
    Succeeded,
    Failed(ErrorKind),
}

impl PlaybackState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Succeeded | PlaybackState::Failed(_))
    }
}

/// Latest state of the most recent playback session
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackStatus {
    /// Monotonic session counter; 0 before the first segment
    pub generation: u64,
    pub session_id: Option<Uuid>,
    pub question_id: Option<u32>,
    pub role: Option<Role>,
    pub state: PlaybackState,
    /// When the session entered `state`
    pub since: DateTime<Utc>,
}

impl PlaybackStatus {
    pub fn idle() -> Self {
        Self {
            generation: 0,
            session_id: None,
            question_id: None,
            role: None,
            state: PlaybackState::Idle,
            since: Utc::now(),
        }
    }
}

/// Identity of one segment's playback session
#[derive(Debug, Clone)]
pub(crate) struct SessionTicket {
    pub id: Uuid,
    pub generation: u64,
    pub question_id: u32,
    pub role: Role,
}

impl SessionTicket {
    pub fn status(&self, state: PlaybackState) -> PlaybackStatus {
        PlaybackStatus {
            generation: self.generation,
            session_id: Some(self.id),
            question_id: Some(self.question_id),
            role: Some(self.role),
            state,
            since: Utc::now(),
        }
    }
}
