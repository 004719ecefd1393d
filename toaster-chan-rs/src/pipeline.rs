//! Request orchestration: validate → stage → transcribe → resolve → switch →
//! synthesize → respond.
//!
//! Only validation and transcription can fail a request. Everything after
//! the transcript degrades instead: a resolver error becomes an `unknown`
//! apology, a relay error is logged, a synthesis error drops the audio.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::appliance::{ApplianceSwitch, HttpRelay};
use crate::config::{Config, UploadConfig};
use crate::intent::{Command, IntentResolver, OpenAiIntentResolver, ToasterIntent};
use crate::synthesis::{HttpTextToSpeech, SpeechSynthesizer, SynthesizedAudio};
use crate::transcriber::{truncate_preview, Transcriber, WhisperApiTranscriber};
use crate::upload::{StagedUpload, UploadedAudio};
use crate::{Error, Result};

/// What goes back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToasterReply {
    pub message: String,
    pub command: Command,
    pub audio: Option<SynthesizedAudio>,
}

pub struct ToasterPipeline {
    upload: UploadConfig,
    transcriber: Arc<dyn Transcriber>,
    resolver: Arc<dyn IntentResolver>,
    appliance: Arc<dyn ApplianceSwitch>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl ToasterPipeline {
    pub fn new(
        upload: UploadConfig,
        transcriber: Arc<dyn Transcriber>,
        resolver: Arc<dyn IntentResolver>,
        appliance: Arc<dyn ApplianceSwitch>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            upload,
            transcriber,
            resolver,
            appliance,
            synthesizer,
        }
    }

    /// Wire up the HTTP-backed adapters described by `config`.
    ///
    /// # Errors
    ///
    /// Returns error if a required API key is missing or a client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let transcriber = WhisperApiTranscriber::new(&config.openai, &config.transcription)?;
        let resolver = OpenAiIntentResolver::new(&config.openai, &config.intent)?;
        let relay = HttpRelay::new(&config.relay)?;
        let synthesizer = HttpTextToSpeech::from_config(&config.synthesis)?
            .map(|tts| Arc::new(tts) as Arc<dyn SpeechSynthesizer>);

        Ok(Self::new(
            config.upload.clone(),
            Arc::new(transcriber),
            Arc::new(resolver),
            Arc::new(relay),
            synthesizer,
        ))
    }

    pub fn has_synthesis(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Full voice path for one uploaded clip.
    ///
    /// # Errors
    ///
    /// `InvalidFileType` before any external call, or a staging /
    /// transcription failure. The staged file is gone in every case.
    pub async fn handle_upload(&self, upload: UploadedAudio) -> Result<ToasterReply> {
        upload.validate(&self.upload)?;

        let t0 = Instant::now();
        let staged = StagedUpload::stage(&upload, &self.upload.accepted_extension).await?;
        let transcript = self.transcriber.transcribe(staged.path()).await;
        staged.close();
        let transcript = transcript?;

        let reply = self.respond(&transcript).await;
        info!(
            "Handled {} in {:.0}ms → {}",
            upload.filename.as_deref().unwrap_or("upload"),
            t0.elapsed().as_secs_f64() * 1000.0,
            reply.command
        );
        Ok(reply)
    }

    /// Typed command path, skipping transcription.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the text is blank
    pub async fn handle_text(&self, text: &str) -> Result<ToasterReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("command text is empty".into()));
        }
        Ok(self.respond(text).await)
    }

    async fn respond(&self, transcript: &str) -> ToasterReply {
        info!("Transcript: \"{}\"", truncate_preview(transcript, 80));

        let intent = match self.resolver.resolve(transcript).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!("Falling back to unknown: {e}");
                ToasterIntent::fallback(&e)
            }
        };

        if intent.command != Command::Unknown {
            if let Err(e) = self.appliance.switch(intent.command).await {
                warn!("Toaster not switched {}: {e}", intent.command);
            }
        }

        let audio = match &self.synthesizer {
            Some(synth) => match synth.synthesize(&intent.reply_text).await {
                Ok(audio) => Some(audio),
                Err(e) => {
                    warn!("Replying text-only: {e}");
                    None
                }
            },
            None => None,
        };

        ToasterReply {
            message: intent.reply_text,
            command: intent.command,
            audio,
        }
    }
}
