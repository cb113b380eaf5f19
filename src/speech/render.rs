// Clip library rendering
//
// Pre-renders the static clip library served under `/audio`: one MP3 per
// role per conversation, laid out as `{out}/{role}/{id}.mp3`. Requests are
// spaced out to stay under provider rate limits, and one failed conversation
// does not stop the run.

use anyhow::{Context, Result};
use bytes::Bytes;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::SpeechProvider;
use crate::conversation::{Conversation, Role};
use crate::error::PlaybackError;

/// Outcome of a rendering run
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Clip files written, in render order
    pub written: Vec<PathBuf>,
    /// Conversations that failed, with the error message
    pub failed: Vec<(u32, String)>,
}

/// Renders conversations to clip files through a speech provider
pub struct ClipRenderer {
    provider: Arc<dyn SpeechProvider>,
    output_dir: PathBuf,
    /// Pause after every provider request
    spacing: Duration,
}

impl ClipRenderer {
    pub fn new(provider: Arc<dyn SpeechProvider>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            output_dir: output_dir.into(),
            spacing: Duration::from_millis(500),
        }
    }

    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    /// Path of the clip for `role` in conversation `id`
    pub fn clip_path(&self, id: u32, role: Role) -> PathBuf {
        clip_path(&self.output_dir, id, role)
    }

    pub async fn render<'a>(
        &self,
        conversations: impl IntoIterator<Item = &'a Conversation>,
    ) -> Result<RenderReport> {
        for role in [Role::Officer, Role::Driver] {
            let dir = self.output_dir.join(role.as_str());
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let conversations: Vec<&Conversation> = conversations.into_iter().collect();
        let total = conversations.len();
        info!(
            "Rendering {} clips with {} into {}",
            total * 2,
            self.provider.name(),
            self.output_dir.display()
        );

        let mut report = RenderReport::default();
        for conversation in conversations {
            match self.render_conversation(conversation, &mut report.written).await {
                Ok(()) => info!("Completed conversation {}/{}", conversation.id, total),
                Err(e) => {
                    error!("Failed to render conversation {}: {:#}", conversation.id, e);
                    report.failed.push((conversation.id, format!("{:#}", e)));
                }
            }
        }

        info!(
            "Rendering complete: {} clips written, {} conversations failed",
            report.written.len(),
            report.failed.len()
        );

        Ok(report)
    }

    async fn render_conversation(
        &self,
        conversation: &Conversation,
        written: &mut Vec<PathBuf>,
    ) -> Result<()> {
        for segment in conversation.segments() {
            info!("Rendering {} clip {}", segment.role, conversation.id);

            let audio = self.provider.synthesize(&segment.text).await?;
            let path = self.clip_path(conversation.id, segment.role);
            tokio::fs::write(&path, &audio)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path);

            tokio::time::sleep(self.spacing).await;
        }

        Ok(())
    }
}

pub fn clip_path(root: &Path, id: u32, role: Role) -> PathBuf {
    root.join(role.as_str()).join(format!("{}.mp3", id))
}

/// Officer and driver clips for a batch of conversations, in input order
#[derive(Debug)]
pub struct BatchAudio {
    pub officer: Vec<Bytes>,
    pub driver: Vec<Bytes>,
}

/// Synthesize every line of `conversations` concurrently
///
/// Fails with the first provider error.
pub async fn synthesize_batch(
    provider: &dyn SpeechProvider,
    conversations: &[Conversation],
) -> Result<BatchAudio, PlaybackError> {
    let officer = try_join_all(conversations.iter().map(|c| provider.synthesize(&c.officer)));
    let driver = try_join_all(conversations.iter().map(|c| provider.synthesize(&c.driver)));

    let (officer, driver) = tokio::try_join!(officer, driver)?;

    Ok(BatchAudio { officer, driver })
}
