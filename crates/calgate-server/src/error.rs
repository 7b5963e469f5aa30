//! Server error types.
//!
//! Configuration errors are fatal at startup. Upstream and pipeline errors
//! are scoped to one request and never leave the handler.

use std::io;
use std::path::{Path, PathBuf};

use calgate_core::FeedError;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that make a configuration unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("unable to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or does not fit the schema.
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration defines no calendars.
    #[error("no calendars found, configuration should define at least one calendar")]
    NoCalendars,

    /// A calendar name is empty or not safe to use as a path segment.
    #[error("calendar name {name:?} must be non-empty and only use [A-Za-z0-9._-]")]
    InvalidName { name: String },

    /// Two calendars share a name.
    #[error("calendar name {name:?} is defined more than once")]
    DuplicateName { name: String },

    /// A secret file (`feed_url_file`, `token_file`) could not be read.
    #[error("calendar {calendar:?}: unable to read {field} {}: {source}", path.display())]
    SecretFile {
        calendar: String,
        field: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An inline secret reference could not be resolved.
    #[error("calendar {calendar:?}: unable to resolve {field}: {message}")]
    SecretRef {
        calendar: String,
        field: &'static str,
        message: String,
    },

    /// No feed URL was configured.
    #[error("calendar {calendar:?} has neither feed_url nor feed_url_file")]
    MissingFeedUrl { calendar: String },

    /// The feed URL is not an http:// or https:// URL.
    #[error("calendar {calendar:?}: feed URL must be a valid http:// or https:// URL")]
    InvalidFeedUrl { calendar: String },

    /// A non-public calendar has no token.
    #[error(
        "calendar {calendar:?} cannot have authentication disabled without the public option enabled"
    )]
    MissingToken { calendar: String },
}

impl ConfigError {
    /// Creates a read error.
    pub fn read(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Read {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Errors that occur while fetching an upstream feed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed: connection, TLS, timeout, redirect loop.
    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned status {0}")]
    Status(StatusCode),

    /// The response body could not be read.
    #[error("failed to read upstream body: {0}")]
    Body(#[source] reqwest::Error),
}

impl UpstreamError {
    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Request(e) | Self::Body(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Errors that abort one feed request.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fetching the upstream feed failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The upstream feed could not be decoded.
    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the server process.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Upstream client setup error.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// IO error (bind, accept).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
