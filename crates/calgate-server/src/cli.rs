//! Command-line interface definition.

use std::path::PathBuf;

use calgate_core::{TracingConfig, TracingOutputFormat};
use clap::Parser;
use tracing::Level;

/// calgate - filtering gateway for iCalendar feeds
#[derive(Debug, Parser)]
#[command(name = "calgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CALGATE_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log in JSON format
    #[arg(long)]
    pub json: bool,

    /// Override the listen port from the configuration
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Load and validate the configuration, then exit
    #[arg(long)]
    pub validate: bool,
}

impl Cli {
    /// Returns the tracing configuration selected by the flags.
    pub fn tracing_config(&self) -> TracingConfig {
        let mut config = TracingConfig::server();
        if self.debug {
            config = config.with_level(Level::DEBUG);
        }
        if self.json {
            config = config.with_format(TracingOutputFormat::Json);
        }
        config
    }
}
