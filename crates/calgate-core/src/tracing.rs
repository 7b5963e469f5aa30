//! Log output for the gateway process.
//!
//! Two formats: compact lines for a terminal, JSON for log collectors.
//! `RUST_LOG` wins over the configured level when set.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// A global subscriber is already installed
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// One compact line per event
    Compact,
    /// One JSON object per event
    Json,
}

/// Logging settings selected at startup
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for calgate and HTTP request logs when RUST_LOG is not set
    pub default_level: Level,
    /// Line format
    pub output_format: TracingOutputFormat,
}

impl TracingConfig {
    /// Compact INFO logs.
    #[must_use]
    pub fn server() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Compact,
        }
    }

    /// Set the default log level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(self.default_level)))
    }
}

/// Installs the global subscriber. Call once, first thing in `main`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    match config.output_format {
        TracingOutputFormat::Compact => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().compact()))?;
        }
        TracingOutputFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))?;
        }
    }

    Ok(())
}

/// Covers every `calgate_*` crate plus tower-http request spans.
fn default_directive(level: Level) -> String {
    format!("calgate={level},tower_http={level}")
}
