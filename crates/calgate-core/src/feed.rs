//! Feed decoding, filtering and re-encoding.
//!
//! These are the network-free stages of the pipeline: raw upstream text is
//! parsed into an [`icalendar::Calendar`], run through a [`FilterChain`],
//! and serialized back. Calendar-level properties and non-event components
//! (`VTIMEZONE`, `VTODO`, ...) are carried through untouched.

use icalendar::Calendar;
use tracing::debug;

use crate::error::{FeedError, FeedResult};
use crate::filter::FilterChain;

const CALENDAR_START: &str = "BEGIN:VCALENDAR";

/// Per-feed counts of filter decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Events passed through unmodified.
    pub passed: usize,
    /// Events anonymized and kept.
    pub anonymized: usize,
    /// Events removed from the feed.
    pub dropped: usize,
}

impl FilterStats {
    /// Number of events seen.
    pub fn total(&self) -> usize {
        self.passed + self.anonymized + self.dropped
    }
}

/// A filtered, serialized feed.
#[derive(Debug, Clone)]
pub struct FilteredFeed {
    /// Serialized iCalendar document.
    pub body: String,
    /// Decisions taken while filtering.
    pub stats: FilterStats,
}

/// Parses an upstream body into a calendar.
///
/// # Errors
///
/// Returns [`FeedError::NotICalendar`] if the body does not open with a
/// `VCALENDAR` block (an HTML error page, for instance) and
/// [`FeedError::Parse`] if the parser rejects it.
pub fn parse_feed(body: &str) -> FeedResult<Calendar> {
    let body = body.trim_start_matches('\u{feff}').trim_start();
    let opens_calendar = body
        .get(..CALENDAR_START.len())
        .is_some_and(|start| start.eq_ignore_ascii_case(CALENDAR_START));
    if !opens_calendar {
        return Err(FeedError::NotICalendar);
    }

    body.parse::<Calendar>()
        .map_err(|e| FeedError::Parse(e.to_string()))
}

/// Serializes a calendar back to iCalendar text.
pub fn serialize_feed(calendar: &Calendar) -> String {
    calendar.to_string()
}

/// Parses, filters and re-serializes one upstream body.
///
/// # Errors
///
/// Returns a [`FeedError`] if the body cannot be parsed. No partial output
/// is produced.
pub fn filter_feed(body: &str, chain: &FilterChain) -> FeedResult<FilteredFeed> {
    let mut calendar = parse_feed(body)?;
    let stats = chain.apply(&mut calendar);
    debug!(
        total = stats.total(),
        passed = stats.passed,
        anonymized = stats.anonymized,
        dropped = stats.dropped,
        "Filtered feed"
    );

    Ok(FilteredFeed {
        body: serialize_feed(&calendar),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, FilterAction};
    use crate::rules::{EventMatchRules, StringMatchRule};

    fn two_room_feed() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Upstream Corp//Calendar 1.0//EN\r\n\
         X-WR-CALNAME:Work\r\n\
         BEGIN:VTIMEZONE\r\n\
         TZID:Europe/Paris\r\n\
         BEGIN:STANDARD\r\n\
         DTSTART:19701025T030000\r\n\
         TZOFFSETFROM:+0200\r\n\
         TZOFFSETTO:+0100\r\n\
         END:STANDARD\r\n\
         END:VTIMEZONE\r\n\
         BEGIN:VEVENT\r\n\
         UID:room-event@example.com\r\n\
         DTSTAMP:20250101T000000Z\r\n\
         DTSTART;TZID=Europe/Paris:20250205T100000\r\n\
         DTEND;TZID=Europe/Paris:20250205T110000\r\n\
         SUMMARY:Team Meeting\r\n\
         DESCRIPTION:Weekly sync\r\n\
         LOCATION:Room 101\r\n\
         END:VEVENT\r\n\
         BEGIN:VEVENT\r\n\
         UID:building-event@example.com\r\n\
         DTSTAMP:20250101T000000Z\r\n\
         DTSTART:20250206T100000Z\r\n\
         DTEND:20250206T110000Z\r\n\
         SUMMARY:Offsite\r\n\
         LOCATION:Building A\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    }

    #[test]
    fn anonymize_filter_rewrites_summary_and_removes_description() {
        let chain = FilterChain::new(vec![Filter::new(
            EventMatchRules::new().with_summary(StringMatchRule::new().contains("Meeting")),
            FilterAction::Anonymize,
        )]);

        let feed = filter_feed(two_room_feed(), &chain).unwrap();

        assert_eq!(feed.stats.anonymized, 1);
        assert!(feed.body.contains("SUMMARY:Busy"));
        assert!(!feed.body.contains("Team Meeting"));
        assert!(!feed.body.contains("DESCRIPTION"));
        assert!(!feed.body.contains("Room 101"));
        assert!(feed.body.contains("SUMMARY:Offsite"));
    }

    #[test]
    fn drop_filter_removes_matching_events_only() {
        let chain = FilterChain::new(vec![Filter::new(
            EventMatchRules::new().with_location(StringMatchRule::new().prefix("Room")),
            FilterAction::Drop,
        )]);

        let feed = filter_feed(two_room_feed(), &chain).unwrap();

        assert_eq!(
            feed.stats,
            FilterStats {
                passed: 1,
                anonymized: 0,
                dropped: 1
            }
        );
        assert!(!feed.body.contains("room-event@example.com"));
        assert!(feed.body.contains("building-event@example.com"));
        assert_eq!(feed.body.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn calendar_metadata_is_preserved() {
        let chain = FilterChain::default().with_free_busy(true);
        let feed = filter_feed(two_room_feed(), &chain).unwrap();

        assert_eq!(feed.stats.anonymized, 2);
        assert!(feed.body.contains("PRODID:-//Upstream Corp//Calendar 1.0//EN"));
        assert!(feed.body.contains("X-WR-CALNAME:Work"));
        assert!(feed.body.contains("BEGIN:VTIMEZONE"));
        assert!(feed.body.contains("TZID:Europe/Paris"));
    }

    #[test]
    fn calendar_headers_are_not_duplicated() {
        let feed = filter_feed(two_room_feed(), &FilterChain::default()).unwrap();
        let calendar_lines = |key: &str| {
            feed.body
                .lines()
                .filter(|line| line.starts_with(&format!("{key}:")))
                .count()
        };
        assert_eq!(calendar_lines("VERSION"), 1);
        assert_eq!(calendar_lines("PRODID"), 1);
        assert!(calendar_lines("CALSCALE") <= 1);
        assert!(feed.body.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn pass_through_keeps_every_event() {
        let feed = filter_feed(two_room_feed(), &FilterChain::default()).unwrap();
        assert_eq!(feed.stats.passed, 2);
        assert_eq!(feed.stats.total(), 2);
        assert!(feed.body.contains("DESCRIPTION:Weekly sync"));
    }

    #[test]
    fn leading_bom_and_whitespace_are_tolerated() {
        let body = format!("\u{feff}\r\n{}", two_room_feed());
        assert!(parse_feed(&body).is_ok());
    }

    #[test]
    fn html_body_is_not_a_feed() {
        let result = parse_feed("<!DOCTYPE html><html><body>Sign in</body></html>");
        assert!(matches!(result, Err(FeedError::NotICalendar)));
    }

    #[test]
    fn empty_body_is_not_a_feed() {
        assert!(matches!(parse_feed(""), Err(FeedError::NotICalendar)));
    }
}
