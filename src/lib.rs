pub mod api_types;
pub mod backend;
pub mod config;
pub mod fanout;
pub mod history;
pub mod logging;
pub mod prompt;
pub mod server;
pub mod state;
