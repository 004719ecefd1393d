//! Configuration management for toaster-chan.
//!
//! Loads config from YAML files in standard locations. Every section has
//! defaults, so an empty or missing file yields a working (if keyless)
//! configuration. API keys may also come from the environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::persona::Persona;

/// Filler-word hint sent with every transcription request.
pub const DISFLUENCY_HINT: &str = "Umm, let me think like, hmm... Okay, here's what I'm, like, thinking., errrr. All the possible filler words please detect";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub route_prefix: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            route_prefix: "/api".into(),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub accepted_mime: String,
    pub accepted_extension: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_mime: "audio/wav".into(),
            accepted_extension: "wav".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl OpenAiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub model: String,
    pub prompt: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "whisper-1".into(),
            prompt: DISFLUENCY_HINT.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    pub model: String,
    pub persona: Persona,
    /// Replaces the built-in persona prompt when set.
    pub custom_prompt: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_completion_tokens: u32,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            persona: Persona::default(),
            custom_prompt: None,
            temperature: 1.0,
            top_p: 1.0,
            max_completion_tokens: 2048,
        }
    }
}

impl IntentConfig {
    /// The system prompt in effect.
    pub fn system_prompt(&self) -> &str {
        match self.custom_prompt.as_deref() {
            Some(custom) if !custom.trim().is_empty() => custom,
            _ => self.persona.system_prompt(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisProvider {
    #[default]
    OpenAi,
    ElevenLabs,
    Narakeet,
    None,
}

impl SynthesisProvider {
    /// Default `(voice, model, format)` for the provider.
    fn defaults(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::OpenAi => ("onyx", "tts-1", "wav"),
            Self::ElevenLabs => ("mbL34QDB5FptPamlgvX5", "eleven_multilingual_v2", "mp3"),
            // Narakeet picks the model from the voice
            Self::Narakeet => ("Wing-Yi", "", "m4a"),
            Self::None => ("", "", "wav"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub provider: SynthesisProvider,
    /// Falls back to the provider's default voice when unset.
    pub voice: Option<String>,
    pub model: Option<String>,
    /// Audio container requested from the provider.
    pub format: Option<String>,
    /// Overrides the provider's public endpoint.
    pub base_url: Option<String>,
    pub api_key: String,
    pub timeout_secs: u64,
    pub pitch_semitones: f32,
    pub speed: f32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: SynthesisProvider::OpenAi,
            voice: None,
            model: None,
            format: None,
            base_url: None,
            api_key: String::new(),
            timeout_secs: 30,
            pitch_semitones: 0.0,
            speed: 1.0,
        }
    }
}

impl SynthesisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn voice(&self) -> &str {
        pick(self.voice.as_deref(), self.provider.defaults().0)
    }

    pub fn model(&self) -> &str {
        pick(self.model.as_deref(), self.provider.defaults().1)
    }

    pub fn format(&self) -> &str {
        pick(self.format.as_deref(), self.provider.defaults().2)
    }

    /// MIME type of the audio the provider returns.
    pub fn mime_type(&self) -> &'static str {
        match self.format() {
            "mp3" => "audio/mpeg",
            "m4a" => "audio/mp4",
            "opus" => "audio/ogg",
            "flac" => "audio/flac",
            _ => "audio/wav",
        }
    }
}

fn pick<'a>(configured: Option<&'a str>, fallback: &'a str) -> &'a str {
    configured.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(fallback)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub on_url: String,
    pub off_url: String,
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            on_url: "http://192.168.1.50/cm?cmnd=Power%20On".into(),
            off_url: "http://192.168.1.50/cm?cmnd=Power%20Off".into(),
            timeout_secs: 5,
        }
    }
}

impl RelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub openai: OpenAiConfig,
    pub transcription: TranscriptionConfig,
    pub intent: IntentConfig,
    pub synthesis: SynthesisConfig,
    pub relay: RelayConfig,
}

impl Config {
    /// Load configuration from YAML file, then fill empty keys from the
    /// environment.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/toaster-chan/config.yaml
    /// 3. /etc/toaster-chan/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::load_file(path);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn load_file(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/toaster-chan/config.yaml")),
                Some(PathBuf::from("/etc/toaster-chan/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::from_yaml(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }

    /// Fill empty API keys from environment lookups. Config values win.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |keys: &[&str]| keys.iter().find_map(|&k| lookup(k).filter(|v| !v.is_empty()));

        if self.openai.api_key.is_empty() {
            if let Some(key) = first(&["OPEN_AI_KEY", "OPENAI_API_KEY"]) {
                self.openai.api_key = key;
            }
        }

        if self.synthesis.api_key.is_empty() {
            let from_env = match self.synthesis.provider {
                SynthesisProvider::OpenAi => Some(self.openai.api_key.clone()).filter(|k| !k.is_empty()),
                SynthesisProvider::ElevenLabs => first(&["ELEVEN_LABS", "ELEVENLABS_API_KEY"]),
                SynthesisProvider::Narakeet => first(&["NARAKEET_API_KEY"]),
                SynthesisProvider::None => None,
            };
            if let Some(key) = from_env {
                self.synthesis.api_key = key;
            }
        }
    }
}
