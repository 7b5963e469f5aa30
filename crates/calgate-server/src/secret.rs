//! Secret resolution.
//!
//! Feed URLs and tokens are secrets. They can be given three ways:
//!
//! - inline in `config.toml` as plain text
//! - inline as `env::VAR_NAME`, read from the environment
//! - through a `*_file` key, read from disk with surrounding whitespace
//!   trimmed (mounted container secrets usually end with a newline)

use std::io;
use std::path::Path;

/// Resolves an inline value that may reference an environment variable.
///
/// Plain text is returned unchanged.
pub fn resolve(value: &str) -> Result<String, String> {
    match value.strip_prefix("env::") {
        Some(var) => resolve_env(var),
        None => Ok(value.to_string()),
    }
}

/// Reads a secret file and trims surrounding whitespace.
pub fn read_secret_file(path: impl AsRef<Path>) -> io::Result<String> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.trim().to_string())
}

fn resolve_env(var: &str) -> Result<String, String> {
    std::env::var(var).map_err(|_| format!("environment variable `{var}` is not set"))
}
