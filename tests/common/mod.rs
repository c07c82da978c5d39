// These modules are used by the integration tests
#![allow(dead_code)]

pub mod mock_backend;

use actix_web::web;
use chat_gateway::config::{BackendConfig, GatewayConfig, DEFAULT_MAX_TOKENS};
use chat_gateway::state::AppState;
use mock_backend::{MockBackend, MockBackendConfig};
use tempfile::TempDir;

/// Gateway state wired to freshly started mock backends, with throwaway
/// upload and static directories.
pub struct TestContext {
    pub backends: Vec<MockBackend>,
    pub state: web::Data<AppState>,
    pub upload_dir: TempDir,
    pub static_dir: TempDir,
}

impl TestContext {
    pub async fn new(configs: Vec<MockBackendConfig>) -> Self {
        Self::build(configs, 30, 4 * 1024 * 1024).await
    }

    /// Like `new` but with a custom backend round-trip timeout.
    pub async fn with_timeout(configs: Vec<MockBackendConfig>, timeout_secs: u64) -> Self {
        Self::build(configs, timeout_secs, 4 * 1024 * 1024).await
    }

    /// Like `new` but with a custom request body limit.
    pub async fn with_payload_limit(
        configs: Vec<MockBackendConfig>,
        max_payload_size: usize,
    ) -> Self {
        Self::build(configs, 30, max_payload_size).await
    }

    async fn build(
        configs: Vec<MockBackendConfig>,
        timeout_secs: u64,
        max_payload_size: usize,
    ) -> Self {
        let mut backends = Vec::new();
        let mut backend_configs = Vec::new();
        for (i, mock_config) in configs.into_iter().enumerate() {
            let backend = MockBackend::start(mock_config).await;
            backend_configs.push(BackendConfig {
                id: format!("llm{}", i + 1),
                endpoint: backend.url(),
                api_key: format!("test-key-{}", i + 1),
                max_tokens: DEFAULT_MAX_TOKENS,
            });
            backends.push(backend);
        }

        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let static_dir = tempfile::tempdir().expect("Failed to create static dir");

        let config = GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            backends: backend_configs,
            request_timeout_secs: timeout_secs,
            max_payload_size,
            upload_dir: upload_dir.path().to_str().unwrap().to_string(),
            static_dir: static_dir.path().to_str().unwrap().to_string(),
            cors_allowed_origins: vec![],
            log_dir: None,
            log_level: None,
            log_interval_secs: 60,
        };
        let state = web::Data::new(AppState::new(config).expect("Failed to create AppState"));

        Self {
            backends,
            state,
            upload_dir,
            static_dir,
        }
    }

    pub async fn shutdown(mut self) {
        for backend in &mut self.backends {
            backend.stop().await;
        }
    }
}

/// Assemble a raw multipart/form-data body. Each part is
/// (field name, optional filename, content).
pub fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, f
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}
