//! HTTP routes.
//!
//! - `GET /calendars/{name}/feed?token=...` - filtered feed for one calendar
//! - `GET /liveness` - process is up
//! - `GET /readiness` - process accepts traffic
//!
//! Every response carries the same set of security headers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::auth::authorize;
use crate::config::CalendarConfig;
use crate::pipeline::render_feed;
use crate::upstream::UpstreamClient;

/// Media type of served feeds.
pub const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("content-security-policy", "default-src 'none'"),
    ("x-xss-protection", "1; mode=block"),
];

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    calendars: Arc<HashMap<String, CalendarConfig>>,
    upstream: UpstreamClient,
}

impl AppState {
    /// Creates the state from validated calendars.
    pub fn new(calendars: Vec<CalendarConfig>, upstream: UpstreamClient) -> Self {
        let calendars = calendars
            .into_iter()
            .map(|calendar| (calendar.name.clone(), calendar))
            .collect();
        Self {
            calendars: Arc::new(calendars),
            upstream,
        }
    }

    /// Looks up a calendar by name.
    pub fn calendar(&self, name: &str) -> Option<&CalendarConfig> {
        self.calendars.get(name)
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/calendars/{name}/feed", get(calendar_feed))
        .route("/liveness", get(liveness))
        .route("/readiness", get(readiness))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    for &(name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }
    router
}

/// Errors returned to HTTP clients. Details stay in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    NotFound,
    Unauthorized,
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

/// GET /calendars/{name}/feed
async fn calendar_feed(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let calendar = state.calendar(&name).ok_or(ApiError::NotFound)?;

    if !authorize(calendar, query_token(query.as_deref()).as_deref()) {
        warn!(calendar = %calendar.name, "Rejected request with missing or invalid token");
        return Err(ApiError::Unauthorized);
    }

    let feed = render_feed(&state.upstream, calendar).await.map_err(|e| {
        error!(calendar = %calendar.name, error = %e, "Failed to render feed");
        ApiError::Internal
    })?;

    Ok((
        [(header::CONTENT_TYPE, CALENDAR_CONTENT_TYPE)],
        feed.body,
    )
        .into_response())
}

/// The `token` query parameter. Repeating it makes the token absent.
fn query_token(query: Option<&str>) -> Option<String> {
    let mut tokens = url::form_urlencoded::parse(query?.as_bytes())
        .filter(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned());
    let token = tokens.next()?;
    tokens.next().is_none().then_some(token)
}

/// GET /liveness
async fn liveness() -> Json<StatusResponse> {
    Json(StatusResponse { status: "alive" })
}

/// GET /readiness
async fn readiness() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ready" })
}
