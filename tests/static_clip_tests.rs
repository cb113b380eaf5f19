// Integration tests for pre-rendered clip playback
//
// A clip library is written to a temp directory and served by the crate's
// own router; playback goes through the decoded output end to end.

use anyhow::Result;
use bytes::Bytes;
use dot_practice::audio::{AudioSource, DecodedOutput};
use dot_practice::playback::{PlaybackSettings, SegmentResolver, StaticClipResolver, SynthesisResolver};
use dot_practice::speech::SpeechProvider;
use dot_practice::{
    create_router, AppState, Catalog, ErrorKind, PlaybackError, PlaybackOrchestrator, Role,
};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn wav_clip(seconds: f64) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for i in 0..(8000.0 * seconds) as usize {
            writer.write_sample(((i % 40) as i16 - 20) * 300)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// officer/1, driver/1 and officer/2 exist; driver/2 is missing
fn write_library(root: &Path) -> Result<()> {
    for role in ["officer", "driver"] {
        std::fs::create_dir_all(root.join(role))?;
    }

    let clip = wav_clip(0.2)?;
    std::fs::write(root.join("officer/1.mp3"), &clip)?;
    std::fs::write(root.join("driver/1.mp3"), &clip)?;
    std::fs::write(root.join("officer/2.mp3"), &clip)?;

    Ok(())
}

async fn serve_library() -> Result<(TempDir, String)> {
    let dir = TempDir::new()?;
    write_library(dir.path())?;

    let state = AppState::new("dot-practice-test", Arc::new(Catalog::builtin()), dir.path());
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Ok((dir, format!("http://{}", addr)))
}

fn resolver(base_url: &str) -> StaticClipResolver {
    StaticClipResolver::new(reqwest::Client::new(), base_url)
}

fn orchestrator(resolver: Arc<dyn SegmentResolver>) -> PlaybackOrchestrator {
    PlaybackOrchestrator::new(
        Box::new(DecodedOutput::new(reqwest::Client::new())),
        resolver,
        Arc::new(Catalog::builtin()),
        PlaybackSettings {
            inter_segment_delay: Duration::from_millis(50),
            ..PlaybackSettings::default()
        },
    )
}

// ============================================================================
// Static clip resolver
// ============================================================================

#[test]
fn test_clip_url_layout() {
    let resolver = resolver("http://clips.test/");

    assert_eq!(
        resolver.clip_url(4, Role::Officer),
        "http://clips.test/audio/officer/4.mp3"
    );
    assert_eq!(
        resolver.clip_url(10, Role::Driver),
        "http://clips.test/audio/driver/10.mp3"
    );
}

#[tokio::test]
async fn test_check_exists() -> Result<()> {
    let (_dir, base) = serve_library().await?;
    let resolver = resolver(&base);

    assert!(resolver.check_exists(1, Role::Officer).await);
    assert!(resolver.check_exists(2, Role::Officer).await);
    assert!(!resolver.check_exists(2, Role::Driver).await);
    assert!(!resolver.check_exists(42, Role::Officer).await);

    Ok(())
}

#[tokio::test]
async fn test_check_exists_unreachable_server() {
    let resolver = resolver("http://127.0.0.1:1");

    assert!(!resolver.check_exists(1, Role::Officer).await);
}

#[tokio::test]
async fn test_resolve_without_preload_is_url() -> Result<()> {
    let resolver = resolver("http://clips.test");
    let segment = Catalog::builtin().get(3).unwrap().segment(Role::Driver);

    match resolver.resolve(&segment).await? {
        AudioSource::Url(url) => assert_eq!(url, "http://clips.test/audio/driver/3.mp3"),
        other => panic!("Expected URL source, got {}", other.describe()),
    }

    Ok(())
}

#[tokio::test]
async fn test_preload_caches_available_clips() -> Result<()> {
    let (_dir, base) = serve_library().await?;
    let resolver = resolver(&base);

    let cached = resolver.preload(&[1, 2, 3, 4, 5, 6, 7]).await;

    // Three clips exist among the first five conversations
    assert_eq!(cached, 3);
    assert!(resolver.is_cached(1, Role::Officer).await);
    assert!(resolver.is_cached(1, Role::Driver).await);
    assert!(resolver.is_cached(2, Role::Officer).await);
    assert!(!resolver.is_cached(2, Role::Driver).await);

    let segment = Catalog::builtin().get(1).unwrap().segment(Role::Officer);
    match resolver.resolve(&segment).await? {
        AudioSource::Memory { bytes, mime } => {
            assert_eq!(mime, "audio/mpeg");
            assert!(!bytes.is_empty());
        }
        other => panic!("Expected preloaded clip, got {}", other.describe()),
    }

    Ok(())
}

#[tokio::test]
async fn test_preload_replaces_previous_cache() -> Result<()> {
    let (_dir, base) = serve_library().await?;
    let resolver = resolver(&base);

    assert_eq!(resolver.preload(&[1]).await, 2);
    assert_eq!(resolver.preload(&[2]).await, 1);

    assert!(!resolver.is_cached(1, Role::Officer).await);
    assert!(!resolver.is_cached(1, Role::Driver).await);
    assert!(resolver.is_cached(2, Role::Officer).await);

    Ok(())
}

// ============================================================================
// End-to-end playback
// ============================================================================

#[tokio::test]
async fn test_static_conversation_plays_to_completion() -> Result<()> {
    let (_dir, base) = serve_library().await?;
    let player = orchestrator(Arc::new(resolver(&base)));

    let started = std::time::Instant::now();
    player.play_conversation(1).await?;

    // Two 200ms clips and the pause between them
    assert!(started.elapsed() >= Duration::from_millis(440));

    Ok(())
}

#[tokio::test]
async fn test_missing_driver_clip_fails_after_officer() -> Result<()> {
    let (_dir, base) = serve_library().await?;
    let player = orchestrator(Arc::new(resolver(&base)));

    let err = player.play_conversation(2).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Playback);
    assert!(err.to_string().contains("driver/2.mp3"), "{}", err);

    Ok(())
}

// ============================================================================
// Synthesized playback
// ============================================================================

struct WavProvider {
    clip: Bytes,
}

#[async_trait::async_trait]
impl SpeechProvider for WavProvider {
    async fn synthesize(&self, _text: &str) -> Result<Bytes, PlaybackError> {
        Ok(self.clip.clone())
    }

    fn name(&self) -> &str {
        "wav"
    }
}

#[tokio::test]
async fn test_synthesized_segment_plays_to_completion() -> Result<()> {
    let provider = Arc::new(WavProvider {
        clip: Bytes::from(wav_clip(0.1)?),
    });
    let player = orchestrator(Arc::new(SynthesisResolver::new(provider)));

    let segment = player.segment(5, Role::Officer)?;
    player.play_segment(&segment).await?;

    Ok(())
}
