//! Gateway configuration.
//!
//! Everything lives in a single `config.toml`. The file is read once at
//! startup: secrets are resolved, names and URLs are validated, and each
//! calendar's filters are compiled into an immutable [`FilterChain`].
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//!
//! [[calendars]]
//! name = "work"
//! feed_url_file = "/run/secrets/work_url"
//! token = "env::WORK_TOKEN"
//!
//! [[calendars.filters]]
//! description = "Hide 1:1s"
//! action = "anonymize"
//! [calendars.filters.match]
//! summary = { contains = "1:1" }
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use calgate_core::{Filter, FilterChain};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::secret;

/// Default bound on one upstream fetch.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Raw settings (config.toml)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    server: ServerSettings,

    #[serde(default)]
    calendars: Vec<CalendarSettings>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    /// Address to bind.
    pub listen: SocketAddr,

    /// Upstream fetch timeout in seconds.
    pub upstream_timeout_secs: u64,

    /// `User-Agent` sent to upstream servers.
    pub user_agent: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            user_agent: concat!("calgate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ServerSettings {
    /// Builder: replace the listen port, keeping the address.
    pub fn with_port(mut self, port: u16) -> Self {
        self.listen.set_port(port);
        self
    }

    /// Returns the upstream timeout as a [`Duration`].
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

/// One `[[calendars]]` entry as written in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarSettings {
    /// Path segment identifying the calendar.
    pub name: String,

    /// Upstream feed URL (supports `env::`).
    #[serde(default)]
    pub feed_url: Option<String>,

    /// File holding the upstream feed URL. Takes precedence over `feed_url`.
    #[serde(default)]
    pub feed_url_file: Option<PathBuf>,

    /// Access token (supports `env::`).
    #[serde(default)]
    pub token: Option<String>,

    /// File holding the access token. Takes precedence over `token`.
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// Serve without a token.
    #[serde(default)]
    pub public: bool,

    /// Anonymize every event that is not dropped.
    #[serde(default, alias = "freebusy_mode")]
    pub free_busy: bool,

    /// Filters in evaluation order.
    #[serde(default)]
    pub filters: Vec<Filter>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// A validated calendar, ready to serve.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// Path segment identifying the calendar.
    pub name: String,
    /// Upstream feed URL.
    pub feed_url: Url,
    /// Access token, if any.
    pub token: Option<String>,
    /// Serve without a token.
    pub public: bool,
    /// Compiled filter chain.
    pub chain: FilterChain,
}

/// The loaded gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Calendars in configuration order.
    pub calendars: Vec<CalendarConfig>,
}

impl GatewayConfig {
    /// Loads, resolves and validates a configuration file.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        let config = Self::from_toml(&content)?;
        info!(
            path = %path.display(),
            calendars = config.calendars.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parses, resolves and validates configuration text.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        if raw.calendars.is_empty() {
            return Err(ConfigError::NoCalendars);
        }

        let mut seen = HashSet::new();
        let mut calendars = Vec::with_capacity(raw.calendars.len());
        for settings in raw.calendars {
            validate_name(&settings.name)?;
            if !seen.insert(settings.name.clone()) {
                return Err(ConfigError::DuplicateName {
                    name: settings.name,
                });
            }
            calendars.push(settings.resolve()?);
        }

        Ok(Self {
            server: raw.server,
            calendars,
        })
    }

    /// Looks up a calendar by name.
    pub fn calendar(&self, name: &str) -> Option<&CalendarConfig> {
        self.calendars.iter().find(|calendar| calendar.name == name)
    }
}

impl CalendarSettings {
    /// Resolves secrets and compiles the filter chain.
    pub fn resolve(self) -> ConfigResult<CalendarConfig> {
        let raw_url = self
            .resolve_secret("feed_url", self.feed_url.as_deref(), self.feed_url_file.as_deref())?
            .ok_or_else(|| ConfigError::MissingFeedUrl {
                calendar: self.name.clone(),
            })?;
        let feed_url = parse_feed_url(&raw_url).ok_or_else(|| ConfigError::InvalidFeedUrl {
            calendar: self.name.clone(),
        })?;

        let token =
            self.resolve_secret("token", self.token.as_deref(), self.token_file.as_deref())?;
        match (&token, self.public) {
            (None, false) => {
                return Err(ConfigError::MissingToken {
                    calendar: self.name,
                });
            }
            (None, true) => {
                warn!(calendar = %self.name, "Calendar is public and has no token");
            }
            _ => {}
        }

        if self.filters.is_empty() {
            warn!(
                calendar = %self.name,
                "Calendar has no filters, running in proxy-only mode"
            );
        }
        for filter in self.filters.iter().filter(|f| !f.rules.has_conditions()) {
            warn!(
                calendar = %self.name,
                filter = filter.label(),
                "Filter has no match conditions and applies to every event"
            );
        }

        Ok(CalendarConfig {
            chain: FilterChain::new(self.filters).with_free_busy(self.free_busy),
            name: self.name,
            feed_url,
            token,
            public: self.public,
        })
    }

    /// Resolves an inline value or its `*_file` counterpart. Empty values
    /// count as unset.
    fn resolve_secret(
        &self,
        field: &'static str,
        inline: Option<&str>,
        file: Option<&Path>,
    ) -> ConfigResult<Option<String>> {
        let value = if let Some(path) = file {
            secret::read_secret_file(path).map_err(|source| ConfigError::SecretFile {
                calendar: self.name.clone(),
                field,
                path: path.to_path_buf(),
                source,
            })?
        } else if let Some(inline) = inline {
            secret::resolve(inline).map_err(|message| ConfigError::SecretRef {
                calendar: self.name.clone(),
                field,
                message,
            })?
        } else {
            return Ok(None);
        };

        Ok(Some(value).filter(|value| !value.is_empty()))
    }
}

fn validate_name(name: &str) -> ConfigResult<()> {
    let path_safe = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if name.is_empty() || !path_safe || name == "." || name == ".." {
        return Err(ConfigError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn parse_feed_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}
