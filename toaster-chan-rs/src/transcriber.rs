//! Speech-to-text via an OpenAI-compatible `/audio/transcriptions` endpoint.
//!
//! Sends the staged upload as multipart together with a filler-word hint
//! and asks for a plain-text transcript back.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, error, info};

use crate::config::{OpenAiConfig, TranscriptionConfig};
use crate::{Error, Result};

/// Turns a recorded clip into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String>;
}

pub struct WhisperApiTranscriber {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    prompt: String,
}

impl WhisperApiTranscriber {
    /// # Errors
    ///
    /// Returns error if the API key is missing or the client cannot be built
    pub fn new(openai: &OpenAiConfig, config: &TranscriptionConfig) -> Result<Self> {
        if openai.api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for transcription".into()));
        }

        let client = Client::builder().timeout(openai.timeout()).build()?;

        Ok(Self {
            client,
            base_url: openai.base_url.trim_end_matches('/').to_string(),
            api_key: openai.api_key.clone(),
            model: config.model.clone(),
            prompt: config.prompt.clone(),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperApiTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        let t0 = Instant::now();

        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| Error::Transcription(format!("cannot read {}: {e}", audio.display())))?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".into());

        debug!(audio_bytes = bytes.len(), file = %file_name, "starting Whisper transcription");

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("model", self.model.clone())
            .text("response_format", "text")
            .text("prompt", self.prompt.clone());

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Whisper request failed");
                Error::Transcription(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Transcription(format!("Whisper API error {status}: {body}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Transcription(e.to_string()))?
            .trim()
            .to_string();

        info!(
            "Transcribed in {:.0}ms: \"{}\"",
            t0.elapsed().as_secs_f64() * 1000.0,
            truncate_preview(&text, 80)
        );
        Ok(text)
    }
}

pub(crate) fn truncate_preview(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    }
}
