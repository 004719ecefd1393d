//! Intent resolution: transcript → in-character reply + toaster command.
//!
//! One chat-completion call does both jobs. The request pins the output to a
//! strict two-field JSON schema, so the reply is parsed straight into
//! [`ToasterIntent`] without further checks.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::config::{IntentConfig, OpenAiConfig};
use crate::{Error, Result};

/// What the user asked the toaster to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    On,
    Off,
    Unknown,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved request. Field names match the generation schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToasterIntent {
    #[serde(rename = "audio_response")]
    pub reply_text: String,
    pub command: Command,
}

impl ToasterIntent {
    pub fn new(reply_text: impl Into<String>, command: Command) -> Self {
        Self {
            reply_text: reply_text.into(),
            command,
        }
    }

    /// Stand-in used when the generator fails: never toggles anything, still
    /// gives the user something to hear.
    pub fn fallback(cause: &Error) -> Self {
        Self::new(
            format!("Sorry ah, my brain a bit blur now, cannot catch what you say. ({cause})"),
            Command::Unknown,
        )
    }
}

/// Classifies a transcript and writes the spoken reply.
#[async_trait]
pub trait IntentResolver: Send + Sync {
    async fn resolve(&self, transcript: &str) -> Result<ToasterIntent>;
}

/// JSON schema the generator must follow.
pub fn toaster_command_schema() -> Value {
    json!({
        "name": "toaster_command",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": {
                "audio_response": {
                    "type": "string",
                    "description": "The spoken reply Toaster-Chan will deliver"
                },
                "command": {
                    "type": "string",
                    "description": "The command to control the toaster.",
                    "enum": ["on", "off", "unknown"]
                }
            },
            "required": ["audio_response", "command"],
            "additionalProperties": false
        }
    })
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
    refusal: Option<String>,
}

/// Chat-completion backed resolver.
pub struct OpenAiIntentResolver {
    client: Client,
    base_url: String,
    api_key: String,
    system_prompt: String,
    config: IntentConfig,
}

impl OpenAiIntentResolver {
    /// # Errors
    ///
    /// Returns error if the API key is missing or the client cannot be built
    pub fn new(openai: &OpenAiConfig, config: &IntentConfig) -> Result<Self> {
        if openai.api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for intent resolution".into()));
        }

        let client = Client::builder().timeout(openai.timeout()).build()?;

        Ok(Self {
            client,
            base_url: openai.base_url.trim_end_matches('/').to_string(),
            api_key: openai.api_key.clone(),
            system_prompt: config.system_prompt().to_string(),
            config: config.clone(),
        })
    }

    fn request_body(&self, transcript: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": transcript }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": toaster_command_schema()
            },
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "max_completion_tokens": self.config.max_completion_tokens,
            "frequency_penalty": 0,
            "presence_penalty": 0
        })
    }
}

#[async_trait]
impl IntentResolver for OpenAiIntentResolver {
    async fn resolve(&self, transcript: &str) -> Result<ToasterIntent> {
        let t0 = Instant::now();
        debug!("Sending transcript to model '{}'", self.config.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(transcript))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "chat completion request failed");
                Error::Resolution(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "chat completion API error");
            return Err(Error::Resolution(format!("chat completion error {status}: {body}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Resolution(format!("malformed completion: {e}")))?;
        let message = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| Error::Resolution("completion had no choices".into()))?;

        if let Some(refusal) = message.refusal {
            return Err(Error::Resolution(format!("model refused: {refusal}")));
        }
        let content = message
            .content
            .ok_or_else(|| Error::Resolution("completion had no content".into()))?;

        let intent: ToasterIntent = serde_json::from_str(&content)
            .map_err(|e| Error::Resolution(format!("reply did not match schema: {e}")))?;

        info!(
            "Resolved command '{}' in {:.0}ms",
            intent.command,
            t0.elapsed().as_secs_f64() * 1000.0
        );
        Ok(intent)
    }
}
