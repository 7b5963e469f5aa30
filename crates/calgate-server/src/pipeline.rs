//! Fetch, filter and re-serialize one calendar.

use calgate_core::{FilteredFeed, filter_feed};
use tracing::info;

use crate::config::CalendarConfig;
use crate::error::PipelineError;
use crate::upstream::UpstreamClient;

/// Produces the filtered feed for a calendar.
///
/// The upstream feed is fetched fresh on every call. Any failure aborts the
/// whole request; no partial feed is returned.
pub async fn render_feed(
    client: &UpstreamClient,
    calendar: &CalendarConfig,
) -> Result<FilteredFeed, PipelineError> {
    let body = client.fetch(&calendar.feed_url).await?;
    let feed = filter_feed(&body, &calendar.chain)?;

    info!(
        calendar = %calendar.name,
        events = feed.stats.total(),
        anonymized = feed.stats.anonymized,
        dropped = feed.stats.dropped,
        "Rendered feed"
    );
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use calgate_core::{
        EventMatchRules, FeedError, Filter, FilterAction, FilterChain, StringMatchRule,
    };
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const FEED: &str = "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Test//Test//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:standup@example.com\r\n\
         DTSTAMP:20250101T000000Z\r\n\
         DTSTART:20250205T090000Z\r\n\
         SUMMARY:Standup\r\n\
         END:VEVENT\r\n\
         BEGIN:VEVENT\r\n\
         UID:review@example.com\r\n\
         DTSTAMP:20250101T000000Z\r\n\
         DTSTART:20250205T140000Z\r\n\
         SUMMARY:Review\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n";

    async fn upstream(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn calendar(server: &MockServer, chain: FilterChain) -> CalendarConfig {
        CalendarConfig {
            name: "work".to_string(),
            feed_url: Url::parse(&format!("{}/work.ics", server.uri())).unwrap(),
            token: Some("changeme".to_string()),
            public: false,
            chain,
        }
    }

    fn client() -> UpstreamClient {
        UpstreamClient::new(Duration::from_secs(5), "calgate-test").unwrap()
    }

    #[tokio::test]
    async fn renders_filtered_feed() {
        let server = upstream(FEED).await;
        let chain = FilterChain::new(vec![Filter::new(
            EventMatchRules::new().with_summary(StringMatchRule::new().contains("Standup")),
            FilterAction::Drop,
        )]);

        let feed = render_feed(&client(), &calendar(&server, chain)).await.unwrap();

        assert_eq!(feed.stats.dropped, 1);
        assert_eq!(feed.stats.passed, 1);
        assert!(!feed.body.contains("Standup"));
        assert!(feed.body.contains("SUMMARY:Review"));
    }

    #[tokio::test]
    async fn non_calendar_body_fails() {
        let server = upstream("<html>login</html>").await;
        let err = render_feed(&client(), &calendar(&server, FilterChain::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Feed(FeedError::NotICalendar)));
    }
}
