//! Routes and handlers

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use crate::config::DEFAULT_VISITS_LIMIT;
use onion_core::EventLog;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    visits: Arc<EventLog>,
    visits_limit: usize,
}

impl AppState {
    /// State backed by the visitor log, returning 100 records from `/visits`
    pub fn new(visits: Arc<EventLog>) -> Self {
        Self {
            visits,
            visits_limit: DEFAULT_VISITS_LIMIT,
        }
    }

    /// Set the number of records returned by `/visits`
    pub fn with_visits_limit(mut self, limit: usize) -> Self {
        self.visits_limit = limit;
        self
    }
}

/// Build the tracking router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/track", post(track).options(preflight))
        .route("/stats", get(stats))
        .route("/visits", get(visits))
        .route("/health", get(|| async { "ok" }))
        .layer(middleware::map_response(cors_headers))
        .with_state(state)
}

async fn cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn track_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({"status": "error", "message": message.into()})),
    )
        .into_response()
}

/// Log one visitor beacon
///
/// The body is parsed as JSON whatever its content type, since
/// `navigator.sendBeacon` posts `text/plain`.
async fn track(State(state): State<AppState>, body: Result<Bytes, BytesRejection>) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            error!(error = %rejection, "failed to read tracking body");
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return track_error(status, rejection.body_text());
        }
    };

    let record = match parse_beacon(&body) {
        Ok(record) => record,
        Err(message) => {
            warn!(%message, "rejected tracking beacon");
            return track_error(StatusCode::BAD_REQUEST, message);
        }
    };

    let referrer = field_label(record.get("referrer"), "direct");
    let url = field_label(record.get("url"), "N/A");
    if state.visits.append(record).await {
        info!(%referrer, %url, "visit logged");
    }

    (StatusCode::OK, Json(json!({"status": "success"}))).into_response()
}

/// Parse a beacon body into a record, or describe why it was rejected
fn parse_beacon(body: &[u8]) -> Result<Map<String, Value>, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err("No data received".to_string());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(record)) if record.is_empty() => Err("No data received".to_string()),
        Ok(Value::Object(record)) => Ok(record),
        Ok(Value::Null) => Err("No data received".to_string()),
        Ok(_) => Err("Expected a JSON object".to_string()),
        Err(e) => Err(format!("Invalid JSON: {e}")),
    }
}

fn field_label(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn read_error(e: &onion_core::TrackingError) -> Response {
    error!(error = %e, "failed to read visitor log");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": e.to_string()})),
    )
        .into_response()
}

async fn stats(State(state): State<AppState>) -> Response {
    // A missing log and one holding only blank lines look the same
    let visits = match state.visits.read_all().await {
        Ok(Some(visits)) if !visits.is_empty() => visits,
        Ok(_) => {
            return Json(json!({"total_visits": 0, "message": "No tracking data yet"}))
                .into_response();
        }
        Err(e) => return read_error(&e),
    };

    let mut referrers = Map::new();
    for visit in &visits {
        let referrer = field_label(visit.get("referrer"), "direct");
        let count = referrers
            .get(&referrer)
            .and_then(Value::as_u64)
            .unwrap_or(0);
        referrers.insert(referrer, Value::from(count + 1));
    }

    Json(json!({
        "total_visits": visits.len(),
        "referrers": referrers,
        "last_visit": visits.last(),
    }))
    .into_response()
}

async fn visits(State(state): State<AppState>) -> Response {
    match state.visits.tail(state.visits_limit).await {
        Ok(visits) => Json(json!({"visits": visits.unwrap_or_default()})).into_response(),
        Err(e) => read_error(&e),
    }
}
