//! Error types for the toaster pipeline.

use thiserror::Error;

/// Result type alias for toaster operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the adapters and the upload orchestrator
#[derive(Debug, Error)]
pub enum Error {
    /// Upload rejected before any external call
    #[error("invalid file type: {0}")]
    InvalidFileType(String),

    /// Request body unusable (e.g. empty command text)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Speech-to-text failed; fatal to the request
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// Generation service failed; the pipeline degrades to `unknown`
    #[error("intent resolution failed: {0}")]
    Resolution(String),

    /// Relay call failed or timed out; logged, never surfaced
    #[error("appliance unreachable: {0}")]
    ApplianceUnreachable(String),

    /// Text-to-speech failed; the response goes out text-only
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    /// Pitch/speed adjustment failed
    #[error("post-processing failed: {0}")]
    PostProcess(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the caller sent something we refuse to process
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidFileType(_) | Self::InvalidInput(_))
    }
}
