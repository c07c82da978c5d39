use crate::backend::BackendClient;
use crate::config::GatewayConfig;
use crate::fanout::{self, BackendOutcome};
use crate::history::{ConversationHistory, Turn};
use crate::prompt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to save {name}: invalid filename")]
    InvalidFilename { name: String },

    #[error("Failed to save {name}: {reason}")]
    WriteFailed { name: String, reason: String },
}

/// Process-wide state shared by every request handler.
#[derive(Debug)]
pub struct AppState {
    pub config: GatewayConfig,
    pub client: BackendClient,
    pub history: ConversationHistory,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let client = BackendClient::new(config.request_timeout_secs)?;
        Ok(AppState {
            config,
            client,
            history: ConversationHistory::new(),
        })
    }

    /// Run one chat round: record the user turn, render the prompt from a
    /// transcript snapshot and fan the prompt out to every backend.
    ///
    /// The user turn is appended before the snapshot is taken, so the
    /// prompt always contains the message being answered. Each successful
    /// completion is appended afterwards in backend order; failed backends
    /// contribute nothing to the transcript.
    pub async fn run_chat(&self, message: String, theme: &str) -> Vec<BackendOutcome> {
        self.history.append(Turn::user(message));
        let transcript = self.history.snapshot();
        let rendered = prompt::build_prompt(theme, &transcript);
        debug!(
            "Dispatching {} char prompt to {} backends",
            rendered.len(),
            self.config.backends.len()
        );

        let outcomes = fanout::dispatch_all(&self.client, &self.config.backends, &rendered).await;

        for outcome in &outcomes {
            if let BackendOutcome::Success { text, .. } = outcome {
                self.history.append(Turn::assistant(text.clone()));
            }
        }
        outcomes
    }

    /// Persist one uploaded file under the configured upload directory.
    ///
    /// Client-supplied names are reduced to their final path component, so
    /// a name like `../../etc/passwd` stores `passwd` inside the upload
    /// directory instead of escaping it. Returns the stored name.
    pub async fn save_upload(&self, filename: &str, data: &[u8]) -> Result<String, UploadError> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::InvalidFilename {
                name: filename.to_string(),
            })?;

        let dir = Path::new(&self.config.upload_dir);
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| UploadError::WriteFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        tokio::fs::write(dir.join(name), data)
            .await
            .map_err(|e| UploadError::WriteFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Stored upload {} ({} bytes)", name, data.len());
        Ok(name.to_string())
    }
}
