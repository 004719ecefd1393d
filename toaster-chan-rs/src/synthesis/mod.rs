//! Speech synthesis for the spoken reply.
//!
//! - `tts`: HTTP text-to-speech providers (OpenAI, ElevenLabs, Narakeet)
//! - `shaper`: optional pitch/speed post-processing of WAV output

pub mod shaper;
pub mod tts;

use async_trait::async_trait;

use crate::Result;

pub use shaper::VoiceShaper;
pub use tts::HttpTextToSpeech;

/// Audio returned by a synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Turns reply text into audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio>;
}
