//! Filters and the per-calendar filter chain.
//!
//! A [`Filter`] pairs an [`EventMatchRules`] with a [`FilterAction`]. A
//! [`FilterChain`] evaluates its filters in configured order and the first
//! filter that matches decides the event's fate; later filters are not
//! consulted. Events that no filter matches pass through unmodified.
//!
//! In free-busy mode every event that is not dropped is anonymized, whatever
//! the deciding filter said.

use icalendar::{Calendar, CalendarComponent, Event};
use serde::Deserialize;
use tracing::trace;

use crate::anonymize::anonymize;
use crate::feed::FilterStats;
use crate::rules::EventMatchRules;

/// What to do with an event matched by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterAction {
    /// Exclude the event from the output feed.
    #[serde(alias = "remove")]
    Drop,
    /// Reduce the event to a bare "Busy" block.
    Anonymize,
    /// Pass the event through unmodified and stop evaluating filters.
    Keep,
}

/// A configured (match rules, action) pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    /// Human readable label, used in logs.
    #[serde(default)]
    pub description: Option<String>,

    /// Rules an event must satisfy for this filter to apply.
    #[serde(rename = "match", default)]
    pub rules: EventMatchRules,

    /// Action taken on matching events.
    pub action: FilterAction,
}

impl Filter {
    /// Creates a filter.
    pub fn new(rules: EventMatchRules, action: FilterAction) -> Self {
        Self {
            description: None,
            rules,
            action,
        }
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns true if this filter applies to the event.
    pub fn matches(&self, event: &Event) -> bool {
        self.rules.matches(event)
    }

    /// Returns the description, or a placeholder for unlabeled filters.
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or("<unnamed>")
    }
}

/// The outcome of running the filter chain on one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep the event as is.
    Pass,
    /// Keep the event after anonymizing it.
    Anonymize,
    /// Remove the event from the feed.
    Drop,
}

/// Ordered filters for one calendar, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<Filter>,
    free_busy: bool,
}

impl FilterChain {
    /// Creates a chain from filters in evaluation order.
    pub fn new(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            free_busy: false,
        }
    }

    /// Builder: enable or disable free-busy mode.
    pub fn with_free_busy(mut self, free_busy: bool) -> Self {
        self.free_busy = free_busy;
        self
    }

    /// Returns the filters in evaluation order.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Returns true if free-busy mode is enabled.
    pub fn is_free_busy(&self) -> bool {
        self.free_busy
    }

    /// Returns true if the chain leaves every event untouched.
    pub fn is_pass_through(&self) -> bool {
        self.filters.is_empty() && !self.free_busy
    }

    /// Decides what happens to one event.
    pub fn decide(&self, event: &Event) -> Decision {
        let matched = self.filters.iter().find(|filter| filter.matches(event));
        if let Some(filter) = matched {
            trace!(filter = filter.label(), action = ?filter.action, "Filter matched event");
        }

        let decision = match matched.map(|filter| filter.action) {
            Some(FilterAction::Drop) => return Decision::Drop,
            Some(FilterAction::Anonymize) => Decision::Anonymize,
            Some(FilterAction::Keep) | None => Decision::Pass,
        };

        if self.free_busy {
            Decision::Anonymize
        } else {
            decision
        }
    }

    /// Applies the chain to every event of a calendar in place.
    ///
    /// Dropped events are removed; the remaining events keep their original
    /// relative order. Non-event components and calendar-level properties
    /// are left alone.
    pub fn apply(&self, calendar: &mut Calendar) -> FilterStats {
        let mut stats = FilterStats::default();

        calendar.components.retain_mut(|component| {
            let CalendarComponent::Event(event) = component else {
                return true;
            };
            match self.decide(event) {
                Decision::Pass => {
                    stats.passed += 1;
                    true
                }
                Decision::Anonymize => {
                    anonymize(event);
                    stats.anonymized += 1;
                    true
                }
                Decision::Drop => {
                    stats.dropped += 1;
                    false
                }
            }
        });

        stats
    }
}
