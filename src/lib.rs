pub mod audio;
pub mod config;
pub mod conversation;
pub mod error;
pub mod http;
pub mod playback;
pub mod speech;

pub use audio::{AudioOutput, AudioSource, ClipInfo, DecodedOutput, OutputEvent};
pub use config::Config;
pub use conversation::{Catalog, Conversation, Role, Segment};
pub use error::{ErrorKind, PlaybackError, TimeoutStage};
pub use http::{create_router, AppState};
pub use playback::{
    PlaybackOrchestrator, PlaybackSettings, PlaybackState, PlaybackStatus, SegmentResolver,
    SourceKind, StaticClipResolver, SynthesisResolver,
};
pub use speech::{ClipRenderer, ElevenLabsProvider, RelayProvider, SpeechProvider, SpeechProviderFactory};
