//! Conversation playback
//!
//! This module sequences officer/driver segments through one shared audio
//! output:
//! - `SegmentResolver`: where a segment's audio comes from (synthesis or
//!   pre-rendered clips)
//! - `PlaybackOrchestrator`: per-segment state machine with deadline,
//!   preemption and cleanup
//! - `PlaybackStatus`: observable state of the latest session

mod orchestrator;
mod resolver;
mod session;

pub use orchestrator::{PlaybackOrchestrator, PlaybackSettings};
pub use resolver::{
    SegmentResolver, SegmentResolverFactory, SourceKind, StaticClipResolver, SynthesisResolver,
    PRELOAD_LIMIT,
};
pub use session::{PlaybackState, PlaybackStatus};
