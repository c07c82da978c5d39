use crate::backend::{BackendClient, BackendError};
use crate::config::BackendConfig;
use futures::future::join_all;
use tracing::error;

/// Result of one backend call within a fan-out round.
#[derive(Debug)]
pub enum BackendOutcome {
    Success { backend_id: String, text: String },
    Failure { backend_id: String, error: BackendError },
}

impl BackendOutcome {
    pub fn backend_id(&self) -> &str {
        match self {
            BackendOutcome::Success { backend_id, .. }
            | BackendOutcome::Failure { backend_id, .. } => backend_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BackendOutcome::Success { .. })
    }
}

/// Send `prompt` to every backend concurrently and wait for all of them.
///
/// The returned vector is position-aligned with `backends`: outcome `i`
/// belongs to `backends[i]` no matter which call finished first. One
/// backend failing never cancels the others; failures are captured as
/// outcomes instead of short-circuiting the round.
pub async fn dispatch_all(
    client: &BackendClient,
    backends: &[BackendConfig],
    prompt: &str,
) -> Vec<BackendOutcome> {
    let tasks = backends.iter().map(|backend| async move {
        match client.generate(backend, prompt).await {
            Ok(text) => BackendOutcome::Success {
                backend_id: backend.id.clone(),
                text,
            },
            Err(err) => {
                error!("Fan-out call failed: {}", err);
                BackendOutcome::Failure {
                    backend_id: backend.id.clone(),
                    error: err,
                }
            }
        }
    });

    join_all(tasks).await
}
