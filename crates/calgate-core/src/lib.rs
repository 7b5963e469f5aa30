//! Filter-and-transform core for calgate.
//!
//! - [`StringMatchRule`] / [`EventMatchRules`] - declarative predicates over event properties
//! - [`Filter`] / [`FilterChain`] - ordered, first-match-wins filters with drop, anonymize and keep actions
//! - [`anonymize`] - destructive reduction of an event to a bare "Busy" block
//! - [`filter_feed`] - parse, filter and re-serialize one upstream feed
//!
//! ```text
//! upstream text ──parse_feed──▶ Calendar ──FilterChain::apply──▶ Calendar ──serialize_feed──▶ text
//! ```

pub mod anonymize;
pub mod error;
pub mod feed;
pub mod filter;
pub mod rules;
pub mod tracing;

pub use anonymize::{BUSY_SUMMARY, anonymize, is_kept_property};
pub use error::{FeedError, FeedResult, RuleError};
pub use feed::{FilterStats, FilteredFeed, filter_feed, parse_feed, serialize_feed};
pub use filter::{Decision, Filter, FilterAction, FilterChain};
pub use rules::{EventMatchRules, StringMatchRule};
pub use crate::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
