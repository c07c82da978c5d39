use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token budget requested from every backend for a single completion.
pub const DEFAULT_MAX_TOKENS: u32 = 150;

/// One text-generation backend the gateway fans out to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Stable identity used in response labels, error reports and logs.
    /// Backends keep their configuration order: the first configured
    /// backend is `llm1`, the second `llm2`, and so on.
    pub id: String,
    /// Full URL of the backend's generation endpoint.
    pub endpoint: String,
    /// Credential sent as a bearer token on every call. May be empty when
    /// the backend does not check authorization.
    pub api_key: String,
    /// Completion budget forwarded in every generation request.
    pub max_tokens: u32,
}

/// Validated runtime configuration for the gateway process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub backends: Vec<BackendConfig>,
    /// Per-call budget for one backend round trip, in seconds.
    pub request_timeout_secs: u64,
    /// Maximum accepted request body size in bytes, JSON and multipart alike.
    pub max_payload_size: usize,
    /// Directory uploaded files are stored in. Created on first use.
    pub upload_dir: String,
    /// Directory served under `/static`, expected to contain `index.html`.
    pub static_dir: String,
    /// Origins allowed by CORS. Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
    pub log_dir: Option<String>,
    pub log_level: Option<String>,
    /// Seconds between periodic transcript status log lines.
    pub log_interval_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {reason}")]
    ValidationFailed { reason: String },

    #[error("Invalid value for {field}: '{value}'. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl GatewayConfig {
    /// Validate the whole configuration, returning the first problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backends.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "backend".to_string(),
            });
        }

        for backend in &self.backends {
            validate_endpoint(&backend.id, &backend.endpoint)?;
        }
        validate_unique_ids(&self.backends)?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }
        if self.max_payload_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_payload_size".to_string(),
                value: "0".to_string(),
                reason: "Payload limit must be greater than 0".to_string(),
            });
        }
        if self.log_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "log_interval_secs".to_string(),
                value: "0".to_string(),
                reason: "Log interval must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn validate_endpoint(id: &str, endpoint: &str) -> ConfigResult<()> {
    if endpoint.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: format!("backend '{}'", id),
            value: endpoint.to_string(),
            reason: "Endpoint URL cannot be empty".to_string(),
        });
    }

    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ConfigError::InvalidValue {
            field: format!("backend '{}'", id),
            value: endpoint.to_string(),
            reason: "Endpoint must start with http:// or https://".to_string(),
        });
    }

    match url::Url::parse(endpoint) {
        Ok(parsed) => {
            if parsed.host_str().is_none() {
                return Err(ConfigError::InvalidValue {
                    field: format!("backend '{}'", id),
                    value: endpoint.to_string(),
                    reason: "Endpoint URL must have a host".to_string(),
                });
            }
        }
        Err(e) => {
            return Err(ConfigError::InvalidValue {
                field: format!("backend '{}'", id),
                value: endpoint.to_string(),
                reason: format!("Invalid URL format: {}", e),
            });
        }
    }

    Ok(())
}

fn validate_unique_ids(backends: &[BackendConfig]) -> ConfigResult<()> {
    let mut seen = std::collections::HashSet::new();
    for backend in backends {
        if !seen.insert(backend.id.as_str()) {
            return Err(ConfigError::ValidationFailed {
                reason: format!("Duplicate backend id: {}", backend.id),
            });
        }
    }
    Ok(())
}
