//! HTTP gateway that serves filtered iCalendar feeds.
//!
//! This crate wires [`calgate_core`] into a web service:
//! - TOML configuration with secrets resolved from files or the environment
//! - upstream feed fetching with a bounded timeout
//! - one token-protected endpoint per configured calendar
//! - graceful shutdown on SIGTERM/SIGINT
//!
//! # Example
//!
//! ```rust,no_run
//! use calgate_server::{Gateway, GatewayConfig, SignalHandler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::load_from("config.toml")?;
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener();
//!
//!     Gateway::new(config)?.run(signals.shutdown()).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;

mod auth;
mod config;
mod error;
mod pipeline;
mod routes;
mod secret;
mod server;
mod shutdown;
mod upstream;

pub use auth::{authorize, tokens_match};
pub use config::{
    CalendarConfig, CalendarSettings, DEFAULT_UPSTREAM_TIMEOUT_SECS, GatewayConfig, ServerSettings,
};
pub use error::{ConfigError, ConfigResult, PipelineError, ServerError, ServerResult, UpstreamError};
pub use pipeline::render_feed;
pub use routes::{ApiError, AppState, CALENDAR_CONTENT_TYPE, router};
pub use server::Gateway;
pub use shutdown::{ShutdownSignal, SignalHandler};
pub use upstream::UpstreamClient;
