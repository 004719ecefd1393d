//! Upload validation and scoped staging on disk.
//!
//! The transcription API wants a file, so each accepted upload is written to
//! a fresh temp file. [`StagedUpload`] owns that file and deletes it when
//! dropped, which covers every early return in the pipeline.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::UploadConfig;
use crate::{Error, Result};

/// One uploaded clip as received.
#[derive(Debug, Clone)]
pub struct UploadedAudio {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

impl UploadedAudio {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>, filename: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
            filename,
        }
    }

    /// Check the declared MIME type and file extension against the
    /// accepted pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFileType` on any mismatch
    pub fn validate(&self, rules: &UploadConfig) -> Result<()> {
        let declared = self
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
            .unwrap_or_default();
        if declared != rules.accepted_mime.to_ascii_lowercase() {
            return Err(Error::InvalidFileType(format!(
                "expected {}, got {}",
                rules.accepted_mime,
                if declared.is_empty() { "no content type" } else { declared.as_str() }
            )));
        }

        let extension_ok = self
            .filename
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(rules.accepted_extension.trim_start_matches('.')));
        if !extension_ok {
            return Err(Error::InvalidFileType(format!(
                "filename must end in .{}",
                rules.accepted_extension.trim_start_matches('.')
            )));
        }

        if self.bytes.is_empty() {
            return Err(Error::InvalidFileType("empty upload".into()));
        }

        Ok(())
    }
}

/// Upload written to a uniquely named temp file, removed on drop.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// # Errors
    ///
    /// Returns error if the temp file cannot be created or written
    pub async fn stage(upload: &UploadedAudio, extension: &str) -> Result<Self> {
        let bytes = upload.bytes.clone();
        let suffix = format!(".{}", extension.trim_start_matches('.'));

        let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix("toaster-upload-")
                .suffix(&suffix)
                .tempfile()?;
            file.write_all(&bytes)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!("Staged {} bytes at {}", upload.bytes.len(), file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete now, reporting failures instead of swallowing them in drop.
    pub fn close(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!("Failed to remove staged upload {}: {e}", path.display());
        }
    }
}
