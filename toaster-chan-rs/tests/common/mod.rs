//! Shared test helpers: adapter stubs, multipart bodies, mock servers

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use toaster_chan::appliance::ApplianceSwitch;
use toaster_chan::config::UploadConfig;
use toaster_chan::intent::{Command, IntentResolver, ToasterIntent};
use toaster_chan::pipeline::ToasterPipeline;
use toaster_chan::synthesis::{SpeechSynthesizer, SynthesizedAudio};
use toaster_chan::transcriber::Transcriber;
use toaster_chan::{Error, Result};

/// Transcriber returning a fixed transcript (or failing when `None`)
pub struct StubTranscriber {
    pub transcript: Option<String>,
    pub calls: AtomicUsize,
    /// Staged paths seen, with whether the file existed during the call
    pub seen: Mutex<Vec<(PathBuf, bool)>>,
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((audio.to_path_buf(), audio.exists()));
        self.transcript
            .clone()
            .ok_or_else(|| Error::Transcription("stub transcriber down".into()))
    }
}

/// Resolver returning a fixed intent (or failing when `None`)
pub struct StubResolver {
    pub intent: Option<ToasterIntent>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl IntentResolver for StubResolver {
    async fn resolve(&self, _transcript: &str) -> Result<ToasterIntent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.intent
            .clone()
            .ok_or_else(|| Error::Resolution("stub generator exploded".into()))
    }
}

/// Switch counting calls per command
#[derive(Default)]
pub struct RecordingSwitch {
    pub on: AtomicUsize,
    pub off: AtomicUsize,
    pub unknown: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl ApplianceSwitch for RecordingSwitch {
    async fn switch(&self, command: Command) -> Result<()> {
        let counter = match command {
            Command::On => &self.on,
            Command::Off => &self.off,
            Command::Unknown => &self.unknown,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(Error::ApplianceUnreachable("relay offline".into()))
        } else {
            Ok(())
        }
    }
}

impl RecordingSwitch {
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.on.load(Ordering::SeqCst),
            self.off.load(Ordering::SeqCst),
            self.unknown.load(Ordering::SeqCst),
        )
    }
}

/// Synthesizer echoing the text as bytes (or failing)
#[derive(Default)]
pub struct StubSynth {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl SpeechSynthesizer for StubSynth {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Synthesis("stub TTS quota exceeded".into()));
        }
        Ok(SynthesizedAudio {
            bytes: text.as_bytes().to_vec(),
            mime: "audio/wav".into(),
        })
    }
}

/// A pipeline wired entirely to stubs, with handles to inspect them
pub struct Harness {
    pub transcriber: Arc<StubTranscriber>,
    pub resolver: Arc<StubResolver>,
    pub switch: Arc<RecordingSwitch>,
    pub synth: Arc<StubSynth>,
    pub pipeline: Arc<ToasterPipeline>,
}

pub struct HarnessBuilder {
    transcript: Option<String>,
    intent: Option<ToasterIntent>,
    relay_fails: bool,
    synth_fails: bool,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            transcript: Some("switch on the toaster".into()),
            intent: Some(ToasterIntent::new("Ok lah, I on liao!", Command::On)),
            relay_fails: false,
            synth_fails: false,
        }
    }

    pub fn transcript(mut self, transcript: Option<&str>) -> Self {
        self.transcript = transcript.map(str::to_owned);
        self
    }

    pub fn intent(mut self, intent: Option<ToasterIntent>) -> Self {
        self.intent = intent;
        self
    }

    pub fn relay_fails(mut self) -> Self {
        self.relay_fails = true;
        self
    }

    pub fn synth_fails(mut self) -> Self {
        self.synth_fails = true;
        self
    }

    pub fn build(self) -> Harness {
        let transcriber = Arc::new(StubTranscriber {
            transcript: self.transcript,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        });
        let resolver = Arc::new(StubResolver {
            intent: self.intent,
            calls: AtomicUsize::new(0),
        });
        let switch = Arc::new(RecordingSwitch {
            fail: self.relay_fails,
            ..RecordingSwitch::default()
        });
        let synth = Arc::new(StubSynth {
            fail: self.synth_fails,
            ..StubSynth::default()
        });
        let pipeline = Arc::new(ToasterPipeline::new(
            UploadConfig::default(),
            transcriber.clone(),
            resolver.clone(),
            switch.clone(),
            Some(synth.clone() as Arc<dyn SpeechSynthesizer>),
        ));
        Harness {
            transcriber,
            resolver,
            switch,
            synth,
            pipeline,
        }
    }
}

impl Harness {
    /// Calls made to the external adapters (transcribe, resolve, synthesize)
    pub fn adapter_calls(&self) -> (usize, usize, usize) {
        (
            self.transcriber.calls.load(Ordering::SeqCst),
            self.resolver.calls.load(Ordering::SeqCst),
            self.synth.calls.load(Ordering::SeqCst),
        )
    }

    pub fn staged_paths(&self) -> Vec<(PathBuf, bool)> {
        self.transcriber.seen.lock().unwrap().clone()
    }
}

pub const BOUNDARY: &str = "toaster-test-boundary";

/// Build a multipart body with a single `file` field
pub fn multipart_body(filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Serve `router` on an ephemeral local port, returning its base URL
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Tiny mono WAV clip
pub fn wav_clip(sample_rate: u32, frames: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let s = (0.3 * (2.0 * std::f32::consts::PI * 220.0 * t).sin() * 32767.0) as i16;
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
