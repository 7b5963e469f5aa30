//! Destructive event anonymization.
//!
//! [`anonymize`] reduces an event to a bare "this time is occupied" block:
//! only scheduling properties are copied over, the summary becomes
//! [`BUSY_SUMMARY`], and all nested sub-components such as alarms are
//! dropped. Anything not on the kept list is removed outright, including
//! standard properties like `CONFERENCE` or `IMAGE` and every `X-`
//! extension.

use icalendar::{Component, Event};

/// Summary written to every anonymized event.
pub const BUSY_SUMMARY: &str = "Busy";

/// Properties that describe when an event happens and how it recurs.
const KEPT_PROPERTIES: &[&str] = &[
    "UID",
    "DTSTAMP",
    "DTSTART",
    "DTEND",
    "DURATION",
    "RRULE",
    "RDATE",
    "EXDATE",
    "RECURRENCE-ID",
    "SEQUENCE",
    "STATUS",
    "TRANSP",
    "CLASS",
];

/// Returns true if a property with this name survives [`anonymize`].
///
/// Names are compared case-insensitively. `SUMMARY` is not kept: it is
/// replaced, never copied.
pub fn is_kept_property(name: &str) -> bool {
    KEPT_PROPERTIES
        .iter()
        .any(|kept| kept.eq_ignore_ascii_case(name))
}

/// Anonymizes an event in place.
///
/// The event is rebuilt from the kept properties, which removes every
/// instance of repeatable properties and every sub-component in one pass.
/// Applying the transform twice yields the same event as applying it once.
pub fn anonymize(event: &mut Event) {
    let mut stripped = Event::new();

    for property in event
        .properties()
        .values()
        .filter(|property| is_kept_property(property.key()))
    {
        stripped.append_property(property.clone());
    }

    for property in event
        .multi_properties()
        .values()
        .flatten()
        .filter(|property| is_kept_property(property.key()))
    {
        stripped.append_multi_property(property.clone());
    }

    stripped.summary(BUSY_SUMMARY);
    *event = stripped;
}
