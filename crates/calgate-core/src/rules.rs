//! String and event match rules.
//!
//! A [`StringMatchRule`] is a conjunction of predicates over one string
//! value. An [`EventMatchRules`] holds one such rule per tracked event
//! property and matches an event when every rule that has conditions
//! matches the corresponding property value.
//!
//! Both types deserialize straight from the configuration file. Regular
//! expressions are compiled during deserialization, so an invalid pattern
//! surfaces as a configuration error at load time.

use icalendar::{Component, Event};
use regex::Regex;
use serde::Deserialize;

use crate::error::RuleError;

/// A predicate over a single string value.
///
/// All conditions that are set must hold at the same time. A rule with no
/// conditions is vacuous: [`matches`](Self::matches) accepts every value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "StringMatchSpec")]
pub struct StringMatchRule {
    null: bool,
    contains: Option<String>,
    prefix: Option<String>,
    suffix: Option<String>,
    regex: Option<Regex>,
}

/// On-disk shape of a [`StringMatchRule`]. Empty strings mean "not set".
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StringMatchSpec {
    null: bool,
    contains: String,
    prefix: String,
    suffix: String,
    #[serde(alias = "regex_match")]
    regex: String,
}

impl TryFrom<StringMatchSpec> for StringMatchRule {
    type Error = RuleError;

    fn try_from(spec: StringMatchSpec) -> Result<Self, Self::Error> {
        let mut rule = Self::new()
            .contains(spec.contains)
            .prefix(spec.prefix)
            .suffix(spec.suffix)
            .regex(&spec.regex)?;
        rule.null = spec.null;
        Ok(rule)
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl StringMatchRule {
    /// Creates a vacuous rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: require the value to be empty.
    pub fn null(mut self) -> Self {
        self.null = true;
        self
    }

    /// Builder: require a case-sensitive substring.
    pub fn contains(mut self, needle: impl Into<String>) -> Self {
        self.contains = non_empty(needle.into());
        self
    }

    /// Builder: require a case-sensitive prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = non_empty(prefix.into());
        self
    }

    /// Builder: require a case-sensitive suffix.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = non_empty(suffix.into());
        self
    }

    /// Builder: require an unanchored regex search hit.
    ///
    /// An empty pattern leaves the condition unset.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidRegex`] if the pattern does not compile.
    pub fn regex(mut self, pattern: &str) -> Result<Self, RuleError> {
        self.regex = if pattern.is_empty() {
            None
        } else {
            Some(Regex::new(pattern).map_err(|e| RuleError::invalid_regex(pattern, e))?)
        };
        Ok(self)
    }

    /// Returns true if at least one condition is set.
    pub fn has_conditions(&self) -> bool {
        self.null
            || self.contains.is_some()
            || self.prefix.is_some()
            || self.suffix.is_some()
            || self.regex.is_some()
    }

    /// Returns true if every set condition holds for `value`.
    pub fn matches(&self, value: &str) -> bool {
        if self.null && !value.is_empty() {
            return false;
        }
        if let Some(ref needle) = self.contains
            && !value.contains(needle.as_str())
        {
            return false;
        }
        if let Some(ref prefix) = self.prefix
            && !value.starts_with(prefix.as_str())
        {
            return false;
        }
        if let Some(ref suffix) = self.suffix
            && !value.ends_with(suffix.as_str())
        {
            return false;
        }
        if let Some(ref regex) = self.regex
            && !regex.is_match(value)
        {
            return false;
        }
        true
    }
}

/// One [`StringMatchRule`] per tracked event property.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventMatchRules {
    /// Rule for `SUMMARY`.
    pub summary: StringMatchRule,
    /// Rule for `DESCRIPTION`.
    pub description: StringMatchRule,
    /// Rule for `LOCATION`.
    pub location: StringMatchRule,
    /// Rule for `ORGANIZER`.
    pub organizer: StringMatchRule,
    /// Rule for `URL`.
    pub url: StringMatchRule,
}

impl EventMatchRules {
    /// Creates rules that match every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the summary rule.
    pub fn with_summary(mut self, rule: StringMatchRule) -> Self {
        self.summary = rule;
        self
    }

    /// Builder: set the description rule.
    pub fn with_description(mut self, rule: StringMatchRule) -> Self {
        self.description = rule;
        self
    }

    /// Builder: set the location rule.
    pub fn with_location(mut self, rule: StringMatchRule) -> Self {
        self.location = rule;
        self
    }

    /// Builder: set the organizer rule.
    pub fn with_organizer(mut self, rule: StringMatchRule) -> Self {
        self.organizer = rule;
        self
    }

    /// Builder: set the URL rule.
    pub fn with_url(mut self, rule: StringMatchRule) -> Self {
        self.url = rule;
        self
    }

    fn by_property(&self) -> [(&'static str, &StringMatchRule); 5] {
        [
            ("SUMMARY", &self.summary),
            ("DESCRIPTION", &self.description),
            ("LOCATION", &self.location),
            ("ORGANIZER", &self.organizer),
            ("URL", &self.url),
        ]
    }

    /// Returns true if any property rule has conditions.
    pub fn has_conditions(&self) -> bool {
        self.by_property()
            .iter()
            .any(|(_, rule)| rule.has_conditions())
    }

    /// Returns true if every active property rule matches the event.
    ///
    /// Property names are compared case-insensitively. Absent properties
    /// are matched as the empty string. Rules without conditions are
    /// skipped, so all-vacuous rules match every event.
    pub fn matches(&self, event: &Event) -> bool {
        self.by_property()
            .into_iter()
            .filter(|(_, rule)| rule.has_conditions())
            .all(|(property, rule)| rule.matches(property_value(event, property)))
    }
}

fn property_value<'a>(event: &'a Event, name: &str) -> &'a str {
    event
        .properties()
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map_or("", |(_, property)| property.value())
}
