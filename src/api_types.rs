use crate::fanout::BackendOutcome;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /chat/`. Both fields are optional on the wire; the
/// handler rejects requests whose message is missing or empty.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub theme: Option<String>,
}

/// Client-fault error body, FastAPI style: `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Whole-request failure body: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// One failed backend inside an otherwise successful chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendFailure {
    pub backend: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub uploaded_files: Vec<String>,
}

/// Shape a completed fan-out round into the chat response body.
///
/// Each successful backend contributes a `response_llm<N>` field, where N
/// is the backend's 1-based configuration position, so a given backend
/// always answers under the same label. Failed backends are listed in an
/// `errors` array instead. When every backend failed there is no partial
/// result to return, and the joined failure reasons come back as `Err` for
/// the handler to wrap in a whole-request failure.
pub fn build_chat_body(outcomes: &[BackendOutcome]) -> Result<Value, String> {
    let mut body = Map::new();
    let mut failures: Vec<BackendFailure> = Vec::new();

    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            BackendOutcome::Success { text, .. } => {
                body.insert(format!("response_llm{}", i + 1), Value::String(text.clone()));
            }
            BackendOutcome::Failure { backend_id, error } => {
                failures.push(BackendFailure {
                    backend: backend_id.clone(),
                    error: error.to_string(),
                });
            }
        }
    }

    if body.is_empty() && !failures.is_empty() {
        let joined = failures
            .iter()
            .map(|f| f.error.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(joined);
    }

    if !failures.is_empty() {
        body.insert(
            "errors".to_string(),
            serde_json::to_value(&failures).unwrap_or(Value::Null),
        );
    }

    Ok(Value::Object(body))
}
