use crate::api_types::{self, ChatRequest, ErrorBody, ErrorDetail, UploadResponse};
use crate::config::GatewayConfig;
use crate::logging::{self, LoggingConfig};
use crate::state::{AppState, UploadError};
use actix_cors::Cors;
use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{error, get, post, web, App, Error, HttpRequest, HttpResponse, HttpServer};
use bytes::BytesMut;
use futures_util::TryStreamExt;
use std::path::Path;
use tokio::spawn;
use tracing::{debug, error, info, warn, Level};

// Custom error handler for JSON payload errors.
fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> Error {
    error!("JSON payload error: {:?}", err);
    match &err {
        error::JsonPayloadError::OverflowKnownLength { length, limit } => {
            error::ErrorPayloadTooLarge(format!(
                "Payload too large: {} bytes exceeds limit of {} bytes",
                length, limit
            ))
        }
        error::JsonPayloadError::Overflow { limit } => {
            error::ErrorPayloadTooLarge(format!("Payload exceeds limit of {} bytes", limit))
        }
        _ => error::ErrorBadRequest(format!("Invalid JSON payload: {}", err)),
    }
}

#[get("/health")]
async fn health(_req: HttpRequest, _: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

#[post("/chat/")]
async fn chat(
    _req: HttpRequest,
    req: web::Json<ChatRequest>,
    data: web::Data<AppState>,
) -> HttpResponse {
    let ChatRequest { message, theme } = req.into_inner();

    let message = match message {
        Some(m) if !m.is_empty() => m,
        _ => {
            debug!("Rejecting chat request without a message");
            return HttpResponse::BadRequest().json(ErrorDetail {
                detail: "Message is required.".to_string(),
            });
        }
    };
    let theme = theme.unwrap_or_default();

    let outcomes = data.run_chat(message, &theme).await;
    match api_types::build_chat_body(&outcomes) {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(reason) => {
            error!("All {} backends failed: {}", outcomes.len(), reason);
            HttpResponse::InternalServerError().json(ErrorBody { error: reason })
        }
    }
}

#[post("/upload/")]
async fn upload(
    _req: HttpRequest,
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> HttpResponse {
    let mut uploaded_files = Vec::new();

    // PayloadConfig does not cover multipart streams, so the body limit is
    // enforced here while buffering file contents.
    let limit = data.config.max_payload_size;
    let mut received = 0usize;

    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!("Rejecting malformed multipart payload: {}", err);
                return HttpResponse::BadRequest().json(ErrorDetail {
                    detail: format!("Invalid multipart payload: {}", err),
                });
            }
        };

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);
        let filename = match filename {
            Some(name) => name,
            None => {
                // Plain form fields are not files; drain and skip.
                while let Ok(Some(_)) = field.try_next().await {}
                continue;
            }
        };

        let mut contents = BytesMut::new();
        loop {
            match field.try_next().await {
                Ok(Some(chunk)) => {
                    received += chunk.len();
                    if received > limit {
                        warn!("Rejecting multipart payload over {} bytes", limit);
                        return HttpResponse::PayloadTooLarge().json(ErrorDetail {
                            detail: format!("Payload exceeds limit of {} bytes", limit),
                        });
                    }
                    contents.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(err) => {
                    let failure = UploadError::WriteFailed {
                        name: filename.clone(),
                        reason: err.to_string(),
                    };
                    error!("{}", failure);
                    return HttpResponse::InternalServerError().json(ErrorDetail {
                        detail: failure.to_string(),
                    });
                }
            }
        }

        match data.save_upload(&filename, &contents).await {
            Ok(stored) => uploaded_files.push(stored),
            Err(err) => {
                error!("{}", err);
                return HttpResponse::InternalServerError().json(ErrorDetail {
                    detail: err.to_string(),
                });
            }
        }
    }

    HttpResponse::Ok().json(UploadResponse { uploaded_files })
}

#[get("/")]
async fn index(_req: HttpRequest, data: web::Data<AppState>) -> HttpResponse {
    let path = Path::new(&data.config.static_dir).join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(err) => {
            error!("Failed to read {}: {}", path.display(), err);
            HttpResponse::InternalServerError().json(ErrorDetail {
                detail: "index.html is not available".to_string(),
            })
        }
    }
}

/// Register every request handler. Shared between `startup` and the
/// integration tests so both serve the same route table.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(chat)
        .service(upload)
        .service(health)
        .service(index);
}

/// Route table plus the payload limits, as one configure step. `startup`
/// and the integration tests both build their apps from this so body-size
/// rules and JSON error mapping are exercised the same way in both.
pub fn app_config(max_payload_size: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(
            web::JsonConfig::default()
                .limit(max_payload_size)
                .error_handler(json_error_handler),
        )
        .app_data(web::PayloadConfig::default().limit(max_payload_size));
        routes(cfg);
    }
}

pub async fn periodic_logging(data: web::Data<AppState>) {
    let interval = data.config.log_interval_secs;
    loop {
        tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
        info!(
            "Transcript holds {} turns; fanning out to {} backends",
            data.history.len(),
            data.config.backends.len()
        );
    }
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    if allowed_origins.is_empty() {
        return Cors::permissive();
    }
    let mut cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600);
    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}

pub async fn startup(config: GatewayConfig) -> std::io::Result<()> {
    let level = match config.log_level.as_deref() {
        Some("trace") => Level::TRACE,
        Some("debug") => Level::DEBUG,
        Some("warn") => Level::WARN,
        Some("error") => Level::ERROR,
        _ => Level::INFO,
    };
    let _log_guard = logging::init_logging(LoggingConfig {
        level,
        json_format: false,
        log_dir: config.log_dir.clone(),
        colorize: true,
    });

    info!(
        "🚧 Initializing chat gateway on {}:{}",
        config.host, config.port
    );
    info!(
        "🚧 Fanning out to backends: {:?}",
        config
            .backends
            .iter()
            .map(|b| b.endpoint.as_str())
            .collect::<Vec<_>>()
    );
    info!(
        "🚧 Max payload size: {} MB",
        config.max_payload_size / (1024 * 1024)
    );
    info!("🚧 Upload directory: {}", config.upload_dir);

    let app_state = web::Data::new(
        AppState::new(config.clone())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?,
    );

    spawn(periodic_logging(app_state.clone()));

    info!(
        "✅ Serving chat gateway on {}:{}",
        config.host, config.port
    );

    let bind_addr = (config.host.clone(), config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(build_cors(&config.cors_allowed_origins))
            .app_data(app_state.clone())
            .configure(app_config(config.max_payload_size))
            .service(Files::new("/static", config.static_dir.clone()))
    })
    .bind(bind_addr)?
    .run()
    .await
}
