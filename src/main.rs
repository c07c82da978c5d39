use chat_gateway::config::{
    BackendConfig, ConfigError, ConfigResult, GatewayConfig, DEFAULT_MAX_TOKENS,
};
use chat_gateway::server;
use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "chat-gateway")]
#[command(about = "Chat gateway - fans each chat message out to several LLM backends at once")]
#[command(long_about = r#"
Chat gateway - fans each chat message out to several LLM backends at once

The gateway keeps one shared conversation transcript. Every chat message is
appended to it, rendered into a prompt together with the whole transcript,
and sent to every configured backend concurrently. Clients get one labeled
response per backend that answered.

Examples:
  # Two backends sharing one conversation
  chat-gateway \
    --backend https://llm-one.example.com/generate \
    --backend https://llm-two.example.com/generate \
    --api-key key-one --api-key key-two

  # Local development against one unauthenticated backend
  chat-gateway --backend http://127.0.0.1:9001/generate
"#)]
struct CliArgs {
    /// Host address to bind the gateway server
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the gateway server
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Backend generation endpoint URL (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    backend: Vec<String>,

    /// Bearer credential for the backend at the same position (can be
    /// specified multiple times; omit to send empty credentials)
    #[arg(long, action = ArgAction::Append)]
    api_key: Vec<String>,

    /// Token budget requested from each backend per completion
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Timeout in seconds for one backend round trip
    #[arg(long, default_value_t = 600)]
    request_timeout_secs: u64,

    /// Maximum payload size in bytes
    #[arg(long, default_value_t = 268435456)] // 256MB
    max_payload_size: usize,

    /// Directory uploaded files are stored in
    #[arg(long, default_value = "uploads")]
    upload_dir: String,

    /// Directory served under /static
    #[arg(long, default_value = "static")]
    static_dir: String,

    /// CORS allowed origins (empty allows any origin)
    #[arg(long, num_args = 0..)]
    cors_allowed_origins: Vec<String>,

    /// Directory to store log files
    #[arg(long)]
    log_dir: Option<String>,

    /// Set the logging level
    #[arg(long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: String,

    /// Interval in seconds between transcript status log lines
    #[arg(long, default_value_t = 60)]
    log_interval: u64,
}

impl CliArgs {
    /// Convert CLI arguments to GatewayConfig
    fn to_gateway_config(&self) -> ConfigResult<GatewayConfig> {
        if !self.api_key.is_empty() && self.api_key.len() != self.backend.len() {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "{} backends configured but {} api keys; provide one --api-key per --backend or none at all",
                    self.backend.len(),
                    self.api_key.len()
                ),
            });
        }

        let backends = self
            .backend
            .iter()
            .enumerate()
            .map(|(i, endpoint)| BackendConfig {
                id: format!("llm{}", i + 1),
                endpoint: endpoint.clone(),
                api_key: self.api_key.get(i).cloned().unwrap_or_default(),
                max_tokens: self.max_tokens,
            })
            .collect();

        Ok(GatewayConfig {
            host: self.host.clone(),
            port: self.port,
            backends,
            request_timeout_secs: self.request_timeout_secs,
            max_payload_size: self.max_payload_size,
            upload_dir: self.upload_dir.clone(),
            static_dir: self.static_dir.clone(),
            cors_allowed_origins: self.cors_allowed_origins.clone(),
            log_dir: self.log_dir.clone(),
            log_level: Some(self.log_level.clone()),
            log_interval_secs: self.log_interval,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli_args = CliArgs::parse();

    let config = cli_args.to_gateway_config()?;
    config.validate()?;

    // Print startup info
    println!("Chat gateway starting...");
    println!("Host: {}:{}", config.host, config.port);
    println!(
        "Backends: {:?}",
        config
            .backends
            .iter()
            .map(|b| b.endpoint.as_str())
            .collect::<Vec<_>>()
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move { server::startup(config).await })?;

    Ok(())
}
