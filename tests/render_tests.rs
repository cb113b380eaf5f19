// Integration tests for clip library rendering and batch synthesis

use anyhow::Result;
use bytes::Bytes;
use dot_practice::speech::{synthesize_batch, SpeechProvider};
use dot_practice::{Catalog, ClipRenderer, Conversation, ErrorKind, PlaybackError, Role};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Echoes the text back as "audio" and fails on any text containing `fail_on`
#[derive(Default)]
struct EchoProvider {
    fail_on: Option<&'static str>,
    requests: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl SpeechProvider for EchoProvider {
    async fn synthesize(&self, text: &str) -> Result<Bytes, PlaybackError> {
        self.requests.lock().unwrap().push(text.to_string());

        if self.fail_on.is_some_and(|needle| text.contains(needle)) {
            return Err(PlaybackError::FetchFailed("quota exceeded".to_string()));
        }
        Ok(Bytes::from(text.to_string()))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

fn conversations(ids: &[u32]) -> Vec<Conversation> {
    let catalog = Catalog::builtin();
    ids.iter()
        .map(|id| catalog.get(*id).unwrap().clone())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_render_writes_role_directories() -> Result<()> {
    let out = TempDir::new()?;
    let provider = Arc::new(EchoProvider::default());
    let renderer = ClipRenderer::new(provider.clone(), out.path());

    let report = renderer.render(&conversations(&[1, 2])).await?;

    assert!(report.failed.is_empty());
    assert_eq!(
        report.written,
        vec![
            out.path().join("officer/1.mp3"),
            out.path().join("driver/1.mp3"),
            out.path().join("officer/2.mp3"),
            out.path().join("driver/2.mp3"),
        ]
    );

    let officer = std::fs::read_to_string(out.path().join("officer/1.mp3"))?;
    assert_eq!(officer, "What are you hauling?");
    assert_eq!(renderer.clip_path(2, Role::Driver), out.path().join("driver/2.mp3"));

    // Officer first, then driver, conversation by conversation
    let requests = provider.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[0], "What are you hauling?");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_render_spaces_requests() -> Result<()> {
    let out = TempDir::new()?;
    let renderer = ClipRenderer::new(Arc::new(EchoProvider::default()), out.path())
        .with_spacing(Duration::from_secs(1));

    let started = tokio::time::Instant::now();
    renderer.render(&conversations(&[3])).await?;

    assert!(started.elapsed() >= Duration::from_secs(2));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_render_continues_after_failure() -> Result<()> {
    let out = TempDir::new()?;
    let provider = Arc::new(EchoProvider {
        // Driver line of conversation 2
        fail_on: Some("120 miles"),
        ..EchoProvider::default()
    });
    let renderer = ClipRenderer::new(provider, out.path());

    let report = renderer.render(&conversations(&[1, 2, 3])).await?;

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 2);
    assert!(report.failed[0].1.contains("quota exceeded"));

    // Conversation 2's officer clip was written before the failure
    assert_eq!(report.written.len(), 5);
    assert!(out.path().join("officer/2.mp3").exists());
    assert!(!out.path().join("driver/2.mp3").exists());
    assert!(out.path().join("driver/3.mp3").exists());

    Ok(())
}

#[tokio::test]
async fn test_synthesize_batch_keeps_input_order() -> Result<()> {
    let provider = EchoProvider::default();
    let batch = conversations(&[5, 1, 9]);

    let audio = synthesize_batch(&provider, &batch).await?;

    assert_eq!(audio.officer.len(), 3);
    assert_eq!(audio.driver.len(), 3);
    assert_eq!(audio.officer[1], Bytes::from("What are you hauling?"));
    assert_eq!(
        audio.driver[2],
        Bytes::from("No, officer. I haven't consumed any alcohol.")
    );

    Ok(())
}

#[tokio::test]
async fn test_synthesize_batch_fails_on_first_error() {
    let provider = EchoProvider {
        fail_on: Some("perishable"),
        ..EchoProvider::default()
    };

    let err = synthesize_batch(&provider, &conversations(&[4, 5]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FetchFailed);
}
