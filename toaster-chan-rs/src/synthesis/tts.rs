//! HTTP text-to-speech providers.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use tracing::{error, info, warn};

use super::{SpeechSynthesizer, SynthesizedAudio, VoiceShaper};
use crate::config::{SynthesisConfig, SynthesisProvider};
use crate::{Error, Result};

const OPENAI_BASE: &str = "https://api.openai.com/v1";
const ELEVENLABS_BASE: &str = "https://api.elevenlabs.io/v1";
const NARAKEET_BASE: &str = "https://api.narakeet.com";

/// Synthesizes speech through one of the supported HTTP providers, then
/// optionally reshapes the voice.
pub struct HttpTextToSpeech {
    client: Client,
    provider: SynthesisProvider,
    base_url: String,
    api_key: String,
    voice: String,
    model: String,
    format: String,
    mime: String,
    shaper: Option<VoiceShaper>,
}

impl HttpTextToSpeech {
    /// Build the configured provider. Returns `Ok(None)` when synthesis is
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the voice settings are invalid
    pub fn from_config(config: &SynthesisConfig) -> Result<Option<Self>> {
        let default_base = match config.provider {
            SynthesisProvider::None => return Ok(None),
            SynthesisProvider::OpenAi => OPENAI_BASE,
            SynthesisProvider::ElevenLabs => ELEVENLABS_BASE,
            SynthesisProvider::Narakeet => NARAKEET_BASE,
        };

        if config.api_key.is_empty() {
            return Err(Error::Config(format!(
                "API key required for {:?} speech synthesis",
                config.provider
            )));
        }

        let shaper = VoiceShaper::new(config.pitch_semitones, config.speed)?;
        let mime = match config.provider {
            // ElevenLabs answers MP3 unless asked otherwise
            SynthesisProvider::ElevenLabs => "audio/mpeg",
            _ => config.mime_type(),
        };

        Ok(Some(Self {
            client: Client::builder().timeout(config.timeout()).build()?,
            provider: config.provider,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(default_base)
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key.clone(),
            voice: config.voice().to_string(),
            model: config.model().to_string(),
            format: config.format().to_string(),
            mime: mime.to_string(),
            shaper: (!shaper.is_identity()).then_some(shaper),
        }))
    }

    fn request(&self, text: &str) -> RequestBuilder {
        match self.provider {
            SynthesisProvider::ElevenLabs => {
                #[derive(Serialize)]
                struct ElevenLabsRequest<'a> {
                    text: &'a str,
                    model_id: &'a str,
                }

                self.client
                    .post(format!("{}/text-to-speech/{}", self.base_url, self.voice))
                    .header("xi-api-key", &self.api_key)
                    .header("Accept", "audio/mpeg")
                    .json(&ElevenLabsRequest {
                        text,
                        model_id: &self.model,
                    })
            }
            SynthesisProvider::Narakeet => self
                .client
                .post(format!("{}/text-to-speech/{}", self.base_url, self.format))
                .query(&[("voice", self.voice.as_str())])
                .header("x-api-key", &self.api_key)
                .header("Accept", "application/octet-stream")
                .header("Content-Type", "text/plain")
                .body(text.to_string()),
            SynthesisProvider::OpenAi | SynthesisProvider::None => {
                #[derive(Serialize)]
                struct SpeechRequest<'a> {
                    model: &'a str,
                    input: &'a str,
                    voice: &'a str,
                    response_format: &'a str,
                }

                self.client
                    .post(format!("{}/audio/speech", self.base_url))
                    .bearer_auth(&self.api_key)
                    .json(&SpeechRequest {
                        model: &self.model,
                        input: text,
                        voice: &self.voice,
                        response_format: &self.format,
                    })
            }
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpTextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        let t0 = Instant::now();

        let response = self.request(text).send().await.map_err(|e| {
            error!(error = %e, "TTS request failed");
            Error::Synthesis(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "{:?} TTS error {status}: {body}",
                self.provider
            )));
        }

        let raw = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))?
            .to_vec();

        info!(
            "Synthesized {} chars → {} bytes in {:.0}ms",
            text.chars().count(),
            raw.len(),
            t0.elapsed().as_secs_f64() * 1000.0
        );

        let bytes = match &self.shaper {
            Some(shaper) if self.mime == "audio/wav" => match shaper.apply(&raw) {
                Ok(shaped) => shaped,
                Err(e) => {
                    warn!("Voice shaping skipped: {e}");
                    raw
                }
            },
            Some(_) => {
                warn!("Voice shaping needs WAV output, got {}", self.mime);
                raw
            }
            None => raw,
        };

        Ok(SynthesizedAudio {
            bytes,
            mime: self.mime.clone(),
        })
    }
}
