//! Upstream feed fetching.
//!
//! One shared HTTP client for every calendar. Each request is a single
//! bounded GET: no retries, no caching, no conditional requests.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderValue};
use tracing::debug;
use url::Url;

use crate::error::UpstreamError;

const ACCEPT_CALENDAR: &str = "text/calendar, */*;q=0.5";

/// HTTP client for upstream calendar feeds.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http_client: reqwest::Client,
}

impl UpstreamClient {
    /// Creates a client with a per-request timeout.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self { http_client })
    }

    /// Fetches a feed body.
    ///
    /// Feed URLs are secrets, so they are stripped from the returned errors.
    pub async fn fetch(&self, url: &Url) -> Result<String, UpstreamError> {
        let response = self
            .http_client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static(ACCEPT_CALENDAR))
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Body(e.without_url()))?;
        debug!(bytes = body.len(), "Fetched upstream feed");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(timeout: Duration) -> UpstreamClient {
        UpstreamClient::new(timeout, "calgate-test").unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.ics"))
            .and(header("user-agent", "calgate-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("BEGIN:VCALENDAR"))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/feed.ics", server.uri())).unwrap();
        let body = client(Duration::from_secs(5)).fetch(&url).await.unwrap();
        assert_eq!(body, "BEGIN:VCALENDAR");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/feed.ics", server.uri())).unwrap();
        let err = client(Duration::from_secs(5)).fetch(&url).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status(StatusCode::SERVICE_UNAVAILABLE)));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("BEGIN:VCALENDAR")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/feed.ics", server.uri())).unwrap();
        let err = client(Duration::from_millis(100))
            .fetch(&url)
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err}");
    }

    #[tokio::test]
    async fn errors_do_not_leak_the_feed_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("BEGIN:VCALENDAR")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/private-s3cret.ics", server.uri())).unwrap();
        let err = client(Duration::from_millis(100))
            .fetch(&url)
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("s3cret"));
    }
}
