//! Orchestrator behaviour with stubbed adapters

use toaster_chan::intent::{Command, ToasterIntent};
use toaster_chan::upload::UploadedAudio;
use toaster_chan::Error;

mod common;
use common::HarnessBuilder;

fn wav(filename: &str) -> UploadedAudio {
    UploadedAudio::new(
        common::wav_clip(16000, 1600),
        Some("audio/wav".into()),
        Some(filename.into()),
    )
}

#[tokio::test]
async fn test_switch_on_scenario() {
    let h = HarnessBuilder::new().build();

    let reply = h.pipeline.handle_upload(wav("toast_on.wav")).await.unwrap();

    assert_eq!(reply.message, "Ok lah, I on liao!");
    assert_eq!(reply.command, Command::On);
    assert_eq!(reply.audio.unwrap().bytes, b"Ok lah, I on liao!");
    assert_eq!(h.switch.counts(), (1, 0, 0));
    assert_eq!(h.adapter_calls(), (1, 1, 1));
}

#[tokio::test]
async fn test_switch_off_hits_only_off() {
    let h = HarnessBuilder::new()
        .transcript(Some("off the toaster please"))
        .intent(Some(ToasterIntent::new("Ok, I off liao.", Command::Off)))
        .build();

    let reply = h.pipeline.handle_upload(wav("toast_off.wav")).await.unwrap();

    assert_eq!(reply.command, Command::Off);
    assert_eq!(h.switch.counts(), (0, 1, 0));
}

#[tokio::test]
async fn test_unknown_never_touches_relay() {
    let h = HarnessBuilder::new()
        .transcript(Some("what time is it"))
        .intent(Some(ToasterIntent::new("You drunk ah?", Command::Unknown)))
        .build();

    let reply = h.pipeline.handle_upload(wav("clip.wav")).await.unwrap();

    assert_eq!(reply.command, Command::Unknown);
    assert_eq!(h.switch.counts(), (0, 0, 0));
}

#[tokio::test]
async fn test_wrong_mime_rejected_before_any_adapter() {
    let h = HarnessBuilder::new().build();
    let upload = UploadedAudio::new(
        b"ID3 mp3 data".to_vec(),
        Some("audio/mpeg".into()),
        Some("toast_on.mp3".into()),
    );

    let err = h.pipeline.handle_upload(upload).await.unwrap_err();

    assert!(matches!(err, Error::InvalidFileType(_)));
    assert_eq!(h.adapter_calls(), (0, 0, 0));
    assert_eq!(h.switch.counts(), (0, 0, 0));
    assert!(h.staged_paths().is_empty());
}

#[tokio::test]
async fn test_staged_file_removed_after_success() {
    let h = HarnessBuilder::new().build();

    h.pipeline.handle_upload(wav("toast_on.wav")).await.unwrap();

    let staged = h.staged_paths();
    assert_eq!(staged.len(), 1);
    let (path, existed_during_call) = &staged[0];
    assert!(existed_during_call);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_transcription_failure_is_fatal_and_cleans_up() {
    let h = HarnessBuilder::new().transcript(None).build();

    let err = h.pipeline.handle_upload(wav("toast_on.wav")).await.unwrap_err();

    assert!(matches!(err, Error::Transcription(_)));
    assert!(!err.is_client_error());
    assert_eq!(h.adapter_calls(), (1, 0, 0));
    assert_eq!(h.switch.counts(), (0, 0, 0));
    let staged = h.staged_paths();
    assert!(staged[0].1);
    assert!(!staged[0].0.exists());
}

#[tokio::test]
async fn test_resolver_failure_degrades_to_unknown() {
    let h = HarnessBuilder::new().intent(None).build();

    let reply = h.pipeline.handle_upload(wav("toast_on.wav")).await.unwrap();

    assert_eq!(reply.command, Command::Unknown);
    assert!(reply.message.contains("stub generator exploded"));
    assert_eq!(h.switch.counts(), (0, 0, 0));
    // Still speaks the apology
    assert!(reply.audio.is_some());
    assert!(!h.staged_paths()[0].0.exists());
}

#[tokio::test]
async fn test_relay_failure_keeps_reply() {
    let h = HarnessBuilder::new().relay_fails().build();

    let reply = h.pipeline.handle_upload(wav("toast_on.wav")).await.unwrap();

    assert_eq!(reply.message, "Ok lah, I on liao!");
    assert_eq!(reply.command, Command::On);
    assert!(reply.audio.is_some());
    assert_eq!(h.switch.counts(), (1, 0, 0));
}

#[tokio::test]
async fn test_synthesis_failure_returns_text_only() {
    let h = HarnessBuilder::new().synth_fails().build();

    let reply = h.pipeline.handle_upload(wav("toast_on.wav")).await.unwrap();

    assert_eq!(reply.message, "Ok lah, I on liao!");
    assert!(reply.audio.is_none());
    assert_eq!(h.switch.counts(), (1, 0, 0));
}

#[tokio::test]
async fn test_repeated_runs_classify_identically() {
    let h = HarnessBuilder::new().build();

    let mut commands = Vec::new();
    for _ in 0..5 {
        commands.push(h.pipeline.handle_upload(wav("toast_on.wav")).await.unwrap().command);
    }

    assert!(commands.iter().all(|c| *c == Command::On));
    assert_eq!(h.switch.counts(), (5, 0, 0));
    assert!(h.staged_paths().iter().all(|(p, _)| !p.exists()));
}

#[tokio::test]
async fn test_text_command_skips_transcription() {
    let h = HarnessBuilder::new().build();

    let reply = h.pipeline.handle_text("  on the toaster  ").await.unwrap();

    assert_eq!(reply.command, Command::On);
    assert_eq!(h.adapter_calls(), (0, 1, 1));

    let err = h.pipeline.handle_text("   ").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}
