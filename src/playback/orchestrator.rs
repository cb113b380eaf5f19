use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::resolver::{SegmentResolver, SegmentResolverFactory};
use super::session::{PlaybackState, PlaybackStatus, SessionTicket};
use crate::audio::{AudioOutput, OutputEvent};
use crate::config::{Config, PlaybackConfig};
use crate::conversation::{Catalog, Role, Segment};
use crate::error::{ErrorKind, PlaybackError, TimeoutStage};

/// Timing knobs shared by every segment
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    /// Pause between the officer and driver lines
    pub inter_segment_delay: Duration,
    /// Grace period after `CanPlay` before starting without `CanPlayThrough`
    pub ready_fallback: Duration,
    /// Optional deadline for the output to become ready
    pub load_timeout: Option<Duration>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            inter_segment_delay: Duration::from_millis(800),
            ready_fallback: Duration::from_millis(500),
            load_timeout: None,
        }
    }
}

impl From<&PlaybackConfig> for PlaybackSettings {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            inter_segment_delay: Duration::from_millis(config.inter_segment_delay_ms),
            ready_fallback: Duration::from_millis(config.ready_fallback_ms),
            load_timeout: config.load_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// The shared output and the generation of the session that loaded it
struct OutputSlot {
    device: Box<dyn AudioOutput>,
    /// 0 when no session owns the output
    owner: u64,
}

/// Plays conversations through a single shared audio output
///
/// Cloning is cheap; clones share the output, so a segment started from any
/// clone preempts the segment in flight.
#[derive(Clone)]
pub struct PlaybackOrchestrator {
    output: Arc<Mutex<OutputSlot>>,
    resolver: Arc<dyn SegmentResolver>,
    catalog: Arc<Catalog>,
    settings: PlaybackSettings,
    /// Bumped by every `play_segment`; sessions watch it for preemption
    generation: Arc<watch::Sender<u64>>,
    status: Arc<watch::Sender<PlaybackStatus>>,
}

impl PlaybackOrchestrator {
    pub fn new(
        output: Box<dyn AudioOutput>,
        resolver: Arc<dyn SegmentResolver>,
        catalog: Arc<Catalog>,
        settings: PlaybackSettings,
    ) -> Self {
        info!(
            "Playback orchestrator: {} source, {} output, {}s deadline",
            resolver.name(),
            output.name(),
            resolver.deadline().as_secs_f64()
        );

        Self {
            output: Arc::new(Mutex::new(OutputSlot {
                device: output,
                owner: 0,
            })),
            resolver,
            catalog,
            settings,
            generation: Arc::new(watch::channel(0).0),
            status: Arc::new(watch::channel(PlaybackStatus::idle()).0),
        }
    }

    /// Build with the resolver selected by `config.playback.source`
    pub fn from_config(
        config: &Config,
        output: Box<dyn AudioOutput>,
        catalog: Arc<Catalog>,
    ) -> Result<Self, PlaybackError> {
        let resolver = SegmentResolverFactory::create(config.playback.source, config)?;
        Ok(Self::new(
            output,
            resolver,
            catalog,
            PlaybackSettings::from(&config.playback),
        ))
    }

    /// Watch the state of the most recent session
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status.borrow().clone()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Look up one line of a conversation
    pub fn segment(&self, question_id: u32, role: Role) -> Result<Segment, PlaybackError> {
        self.catalog
            .get(question_id)
            .map(|conversation| conversation.segment(role))
            .ok_or(PlaybackError::UnknownConversation(question_id))
    }

    /// Play the officer line, pause, then the driver line
    ///
    /// Stops at the first failing segment.
    pub async fn play_conversation(&self, question_id: u32) -> Result<(), PlaybackError> {
        let conversation = self
            .catalog
            .get(question_id)
            .ok_or(PlaybackError::UnknownConversation(question_id))?;
        let [officer, driver] = conversation.segments();

        info!("Starting conversation {}", question_id);

        let result = async {
            self.play_segment(&officer).await?;

            debug!("Pause between officer and driver");
            tokio::time::sleep(self.settings.inter_segment_delay).await;

            self.play_segment(&driver).await
        }
        .await;

        match &result {
            Ok(()) => info!("Completed conversation {}", question_id),
            Err(e) => error!("Conversation {} failed: {}", question_id, e),
        }

        result
    }

    /// Play one segment to its natural end
    ///
    /// Preempts any segment already in flight, which then resolves
    /// `Interrupted`. Reports exactly one outcome.
    pub async fn play_segment(&self, segment: &Segment) -> Result<(), PlaybackError> {
        let ticket = self.begin(segment);
        let mut preempted = self.generation.subscribe();

        info!(
            "Playing {} audio for question {} (session {})",
            segment.role, segment.question_id, ticket.id
        );

        // Ends the session if this future is dropped before `finish` completes
        let mut guard = SessionGuard {
            orchestrator: Some(self.clone()),
            ticket: ticket.clone(),
        };

        let result = self.run(&ticket, segment, &mut preempted).await;
        self.finish(&ticket, &result).await;
        guard.disarm();

        result
    }

    fn begin(&self, segment: &Segment) -> SessionTicket {
        let mut generation = 0;
        self.generation.send_modify(|current| {
            *current += 1;
            generation = *current;
        });

        SessionTicket {
            id: Uuid::new_v4(),
            generation,
            question_id: segment.question_id,
            role: segment.role,
        }
    }

    async fn run(
        &self,
        ticket: &SessionTicket,
        segment: &Segment,
        preempted: &mut watch::Receiver<u64>,
    ) -> Result<(), PlaybackError> {
        if *preempted.borrow_and_update() != ticket.generation {
            return Err(PlaybackError::Interrupted);
        }

        self.publish(ticket, PlaybackState::Resolving);
        let source = tokio::select! {
            biased;
            _ = superseded(preempted, ticket.generation) => return Err(PlaybackError::Interrupted),
            resolved = self.resolver.resolve(segment) => resolved?,
        };

        let mut events = {
            let mut slot = self.output.lock().await;
            if *preempted.borrow() != ticket.generation {
                return Err(PlaybackError::Interrupted);
            }

            debug!("Assigning {} to {} output", source.describe(), slot.device.name());
            slot.device.pause().await.map_err(output_error)?;
            slot.device.reset().await.map_err(output_error)?;
            let events = slot.device.load(source).await.map_err(output_error)?;
            slot.owner = ticket.generation;
            events
        };

        self.publish(ticket, PlaybackState::Loading);
        self.await_completion(ticket, &mut events, preempted).await
    }

    /// Drive Loading → Playing → end until the first terminal event
    async fn await_completion(
        &self,
        ticket: &SessionTicket,
        events: &mut mpsc::Receiver<OutputEvent>,
        preempted: &mut watch::Receiver<u64>,
    ) -> Result<(), PlaybackError> {
        let deadline = self.resolver.deadline();
        let started = Instant::now();
        let expires = started + deadline;
        let load_expires = self.settings.load_timeout.map(|t| started + t);

        let mut playing = false;
        let mut fallback_at: Option<Instant> = None;

        loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(OutputEvent::CanPlayThrough) if !playing => {
                        debug!("Can play through, starting {} audio", ticket.role);
                        self.start_playback(ticket).await?;
                        playing = true;
                    }
                    Some(OutputEvent::CanPlay) if !playing && fallback_at.is_none() => {
                        debug!(
                            "Can play, starting in {}ms unless fully buffered first",
                            self.settings.ready_fallback.as_millis()
                        );
                        fallback_at = Some(Instant::now() + self.settings.ready_fallback);
                    }
                    Some(OutputEvent::Stalled) => warn!("Audio stalled but continuing"),
                    Some(OutputEvent::Ended) if playing => return Ok(()),
                    Some(OutputEvent::Error(message)) => return Err(PlaybackError::Playback(message)),
                    Some(event) => debug!("Ignoring {:?} (playing: {})", event, playing),
                    // The output dropped our source
                    None => return Err(PlaybackError::Interrupted),
                },
                _ = superseded(preempted, ticket.generation) => return Err(PlaybackError::Interrupted),
                _ = sleep_until(fallback_at.unwrap_or(expires)), if !playing && fallback_at.is_some() => {
                    debug!("Starting {} audio without full buffer", ticket.role);
                    self.start_playback(ticket).await?;
                    playing = true;
                }
                _ = sleep_until(load_expires.unwrap_or(expires)), if !playing && load_expires.is_some() => {
                    return Err(PlaybackError::Timeout {
                        stage: TimeoutStage::Loading,
                        after: load_expires.unwrap_or(expires) - started,
                    });
                }
                _ = sleep_until(expires) => {
                    let stage = if playing { TimeoutStage::Playing } else { TimeoutStage::Loading };
                    return Err(PlaybackError::Timeout { stage, after: deadline });
                }
            }

            if playing {
                self.publish(ticket, PlaybackState::Playing);
            }
        }
    }

    async fn start_playback(&self, ticket: &SessionTicket) -> Result<(), PlaybackError> {
        let mut slot = self.output.lock().await;
        if slot.owner != ticket.generation {
            return Err(PlaybackError::Interrupted);
        }

        slot.device
            .play()
            .await
            .map_err(|e| PlaybackError::Playback(format!("Play failed: {:#}", e)))
    }

    /// Release the output if this session still owns it and publish the outcome
    async fn finish(&self, ticket: &SessionTicket, result: &Result<(), PlaybackError>) {
        {
            let mut slot = self.output.lock().await;
            if slot.owner == ticket.generation {
                if let Err(e) = slot.device.pause().await {
                    warn!("Failed to pause {} output: {:#}", slot.device.name(), e);
                }
                if let Err(e) = slot.device.release().await {
                    warn!("Failed to release {} output: {:#}", slot.device.name(), e);
                }
                slot.owner = 0;
            }
        }

        let state = match result {
            Ok(()) => {
                info!(
                    "{} audio completed for question {}",
                    ticket.role, ticket.question_id
                );
                PlaybackState::Succeeded
            }
            Err(PlaybackError::Interrupted) => {
                info!(
                    "{} audio for question {} interrupted",
                    ticket.role, ticket.question_id
                );
                PlaybackState::Failed(ErrorKind::Interrupted)
            }
            Err(e) => {
                error!(
                    "{} audio failed for question {}: {}",
                    ticket.role, ticket.question_id, e
                );
                PlaybackState::Failed(e.kind())
            }
        };

        self.publish(ticket, state);
    }

    /// Publish unless a newer session already reported
    fn publish(&self, ticket: &SessionTicket, state: PlaybackState) {
        let status = ticket.status(state);
        self.status.send_if_modified(move |current| {
            let newer = status.generation > current.generation;
            let changed = status.generation == current.generation && status.state != current.state;
            if newer || changed {
                *current = status;
                true
            } else {
                false
            }
        });
    }
}

/// Releases the output and reports `Interrupted` for a session whose
/// `play_segment` future was dropped mid-flight
struct SessionGuard {
    orchestrator: Option<PlaybackOrchestrator>,
    ticket: SessionTicket,
}

impl SessionGuard {
    fn disarm(&mut self) {
        self.orchestrator = None;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(orchestrator) = self.orchestrator.take() else {
            return;
        };
        let ticket = self.ticket.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Session {} dropped before completion", ticket.id);
                handle.spawn(async move {
                    orchestrator
                        .finish(&ticket, &Err(PlaybackError::Interrupted))
                        .await;
                });
            }
            Err(_) => warn!(
                "Session {} dropped outside a runtime; output not released",
                ticket.id
            ),
        }
    }
}

/// Resolves once a newer session has started
async fn superseded(preempted: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        if preempted.changed().await.is_err() {
            // Orchestrator dropped; nothing can preempt us any more
            std::future::pending::<()>().await;
        }
        if *preempted.borrow_and_update() != generation {
            return;
        }
    }
}

fn output_error(err: anyhow::Error) -> PlaybackError {
    PlaybackError::Playback(format!("{:#}", err))
}
