//! Error types for rule construction and feed processing.

use thiserror::Error;

/// Errors raised while building match rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A `regex` condition did not compile.
    #[error("invalid regular expression {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl RuleError {
    /// Creates an invalid regex error.
    pub fn invalid_regex(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            source,
        }
    }
}

/// Errors raised while decoding an upstream feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The body does not start with a VCALENDAR block.
    #[error("upstream body is not an iCalendar document")]
    NotICalendar,

    /// The iCalendar parser rejected the body.
    #[error("failed to parse iCalendar feed: {0}")]
    Parse(String),
}

/// A specialized Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
