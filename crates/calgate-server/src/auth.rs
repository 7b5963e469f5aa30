//! Per-calendar token check.
//!
//! Tokens are compared through their SHA-256 digests so the comparison time
//! does not depend on how many leading bytes match, nor on the token length.

use sha2::{Digest, Sha256};

use crate::config::CalendarConfig;

/// Returns true if the request may read the calendar.
///
/// Public calendars are always readable. Other calendars need a presented
/// token equal to the configured one.
pub fn authorize(calendar: &CalendarConfig, presented: Option<&str>) -> bool {
    if calendar.public {
        return true;
    }
    match (calendar.token.as_deref(), presented) {
        (Some(expected), Some(presented)) => tokens_match(expected, presented),
        _ => false,
    }
}

/// Compares two tokens in constant time.
pub fn tokens_match(expected: &str, presented: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let presented = Sha256::digest(presented.as_bytes());
    expected
        .iter()
        .zip(presented.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use calgate_core::FilterChain;
    use url::Url;

    use super::*;

    fn calendar(token: Option<&str>, public: bool) -> CalendarConfig {
        CalendarConfig {
            name: "work".to_string(),
            feed_url: Url::parse("https://calendar.example.com/work.ics").unwrap(),
            token: token.map(str::to_string),
            public,
            chain: FilterChain::default(),
        }
    }

    #[test]
    fn equal_tokens_match() {
        assert!(tokens_match("changeme", "changeme"));
    }

    #[test]
    fn different_tokens_do_not_match() {
        assert!(!tokens_match("changeme", "changemf"));
        assert!(!tokens_match("changeme", "changeme-longer"));
        assert!(!tokens_match("changeme", ""));
    }

    #[test]
    fn private_calendar_needs_the_right_token() {
        let work = calendar(Some("changeme"), false);
        assert!(authorize(&work, Some("changeme")));
        assert!(!authorize(&work, Some("wrong")));
        assert!(!authorize(&work, None));
    }

    #[test]
    fn public_calendar_ignores_token() {
        let holidays = calendar(None, true);
        assert!(authorize(&holidays, None));
        assert!(authorize(&holidays, Some("anything")));

        let tokened = calendar(Some("changeme"), true);
        assert!(authorize(&tokened, Some("wrong")));
    }

    #[test]
    fn private_calendar_without_token_rejects_everything() {
        let broken = calendar(None, false);
        assert!(!authorize(&broken, None));
        assert!(!authorize(&broken, Some("")));
    }
}
