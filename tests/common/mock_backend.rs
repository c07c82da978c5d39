use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Configuration for mock backend behavior
#[derive(Clone, Debug)]
pub struct MockBackendConfig {
    pub port: u16,
    pub behavior: MockBehavior,
    pub response_delay_ms: u64,
}

impl Default for MockBackendConfig {
    fn default() -> Self {
        Self {
            port: 0,
            behavior: MockBehavior::Fixed("This is a mock completion.".to_string()),
            response_delay_ms: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Reply with the given completion text.
    Fixed(String),
    /// Reply with the received prompt as the completion text.
    EchoPrompt,
    /// Reply with the given HTTP status and an error body.
    Fail(u16),
    /// Reply 200 with a JSON body that has no `response` field.
    MissingResponseField,
    /// Reply 200 with a body that is not JSON at all.
    InvalidJson,
}

/// One generation request as seen by the mock backend.
#[derive(Clone, Debug)]
pub struct ReceivedRequest {
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

struct MockState {
    config: MockBackendConfig,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

/// In-process text-generation backend for integration tests.
pub struct MockBackend {
    url: String,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
    server_handle: Option<actix_web::dev::ServerHandle>,
    join_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockBackend {
    /// Start the mock backend on a free local port.
    pub async fn start(config: MockBackendConfig) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = web::Data::new(MockState {
            config: config.clone(),
            received: received.clone(),
        });

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .default_service(web::post().to(generate_handler))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", config.port))
        .expect("Failed to bind mock backend");

        let addr = server.addrs()[0];
        let server = server.run();
        let server_handle = server.handle();
        let join_handle = tokio::spawn(async move {
            if let Err(e) = server.await {
                eprintln!("Mock backend server error: {}", e);
            }
        });

        // Give the accept loop a moment to come up.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        Self {
            url: format!("http://{}/generate", addr),
            received,
            server_handle: Some(server_handle),
            join_handle: Some(join_handle),
        }
    }

    /// Full URL of the mock generation endpoint.
    pub fn url(&self) -> String {
        self.url.clone()
    }

    /// Every request this backend has received, in arrival order.
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }

    /// Stop the mock backend server.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.stop(true).await;
        }
        if let Some(join) = self.join_handle.take() {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(5), join).await;
        }
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            if let Ok(rt) = tokio::runtime::Handle::try_current() {
                rt.spawn(handle.stop(false));
            }
        }
    }
}

async fn generate_handler(
    req: HttpRequest,
    state: web::Data<MockState>,
    body: web::Bytes,
) -> HttpResponse {
    let authorization = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let parsed: serde_json::Value =
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.received.lock().unwrap().push(ReceivedRequest {
        authorization,
        body: parsed.clone(),
    });

    if state.config.response_delay_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(
            state.config.response_delay_ms,
        ))
        .await;
    }

    match &state.config.behavior {
        MockBehavior::Fixed(text) => HttpResponse::Ok().json(json!({ "response": text })),
        MockBehavior::EchoPrompt => {
            let prompt = parsed
                .get("prompt")
                .and_then(|p| p.as_str())
                .unwrap_or_default();
            HttpResponse::Ok().json(json!({ "response": prompt }))
        }
        MockBehavior::Fail(status) => {
            let code = actix_web::http::StatusCode::from_u16(*status)
                .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
            HttpResponse::build(code).json(json!({ "error": "Injected failure for testing" }))
        }
        MockBehavior::MissingResponseField => {
            HttpResponse::Ok().json(json!({ "usage": { "total_tokens": 7 } }))
        }
        MockBehavior::InvalidJson => HttpResponse::Ok()
            .content_type("application/json")
            .body("not json at all"),
    }
}
