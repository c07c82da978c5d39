use crate::config::BackendConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Body sent to a backend's generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

/// Body returned by a backend. A missing or null `response` field is
/// treated as an empty completion rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub response: Option<String>,
}

/// Failure of a single backend call. Every variant carries the identity of
/// the backend so callers can attribute the failure without extra context.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request to backend {backend_id} timed out")]
    Timeout { backend_id: String },

    #[error("Request to backend {backend_id} failed: {reason}")]
    Transport { backend_id: String, reason: String },

    #[error("Backend {backend_id} returned status {status}")]
    Status {
        backend_id: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to decode response from backend {backend_id}: {reason}")]
    Decode { backend_id: String, reason: String },
}

impl BackendError {
    pub fn backend_id(&self) -> &str {
        match self {
            BackendError::Timeout { backend_id }
            | BackendError::Transport { backend_id, .. }
            | BackendError::Status { backend_id, .. }
            | BackendError::Decode { backend_id, .. } => backend_id,
        }
    }
}

/// HTTP client shared by all backend calls.
///
/// Built once at startup; reqwest multiplexes connections internally, so
/// concurrent calls to different backends never contend here.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(BackendClient { http })
    }

    /// Ask one backend for a completion of `prompt`.
    ///
    /// Authenticates with the backend's bearer credential, enforces the
    /// client-wide timeout and maps every failure mode to a
    /// [`BackendError`] naming the backend.
    pub async fn generate(
        &self,
        backend: &BackendConfig,
        prompt: &str,
    ) -> Result<String, BackendError> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            max_tokens: backend.max_tokens,
        };

        let response = self
            .http
            .post(&backend.endpoint)
            .bearer_auth(&backend.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify(&backend.id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                backend_id: backend.id.clone(),
                status,
            });
        }

        let body: GenerationResponse = response
            .json()
            .await
            .map_err(|e| classify(&backend.id, e))?;

        let text = body.response.unwrap_or_default();
        debug!(
            "Backend {} produced {} chars of completion",
            backend.id,
            text.len()
        );
        Ok(text)
    }
}

fn classify(backend_id: &str, err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout {
            backend_id: backend_id.to_string(),
        }
    } else if err.is_decode() {
        BackendError::Decode {
            backend_id: backend_id.to_string(),
            reason: err.to_string(),
        }
    } else {
        BackendError::Transport {
            backend_id: backend_id.to_string(),
            reason: err.to_string(),
        }
    }
}
