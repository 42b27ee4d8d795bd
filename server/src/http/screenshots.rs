//! Screenshot intake.
//!
//! Per-client rate limit of one screenshot per second, tracked in a bounded
//! map; files land under `<state-dir>/screenshots` with a containment check
//! on the final path.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::http::client_id_from;
use crate::state::ServerState;

/// At most one screenshot per client per this interval.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Bounded tracker capacity; stale entries are purged before rejecting.
const TRACKER_CAP: usize = 10_000;

/// Per-client screenshot rate limiter.
pub struct ScreenshotLimiter {
    inner: Mutex<HashMap<String, Instant>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LimitDecision {
    Allowed,
    RateLimited,
}

impl ScreenshotLimiter {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, client_id: &str) -> LimitDecision {
        self.check_at(client_id, Instant::now())
    }

    fn check_at(&self, client_id: &str, now: Instant) -> LimitDecision {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(last) = inner.get(client_id) {
            if now.duration_since(*last) < MIN_INTERVAL {
                return LimitDecision::RateLimited;
            }
        }
        if inner.len() >= TRACKER_CAP && !inner.contains_key(client_id) {
            // Purge stale entries before refusing a new client.
            inner.retain(|_, at| now.duration_since(*at) < MIN_INTERVAL);
            if inner.len() >= TRACKER_CAP {
                return LimitDecision::RateLimited;
            }
        }
        inner.insert(client_id.to_string(), now);
        LimitDecision::Allowed
    }
}

impl Default for ScreenshotLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a `data:<mime>;base64,<payload>` URL.
pub fn parse_data_url(data_url: &str) -> Option<(String, Vec<u8>)> {
    let rest = data_url.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;
    let mime = if mime.is_empty() { "image/png" } else { mime };
    Some((mime.to_string(), bytes))
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

#[derive(Debug, Deserialize)]
struct ScreenshotBody {
    data_url: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    correlation_id: Option<String>,
    #[serde(default)]
    query_id: Option<String>,
}

/// `POST /screenshots`.
pub async fn intake(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client_id = client_id_from(&headers);
    if state.screenshots.check(&client_id) == LimitDecision::RateLimited {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": "rate_limited", "retry_after_ms": 1000})),
        )
            .into_response();
    }

    let request: ScreenshotBody = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_json", "detail": err.to_string()})),
            )
                .into_response();
        }
    };
    let Some((mime, bytes)) = parse_data_url(&request.data_url) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_data_url"})),
        )
            .into_response();
    };

    let page = request
        .url
        .as_deref()
        .map(gasoline_paths::extract_url_path)
        .unwrap_or_else(|| "/".to_string());
    let stamp = chrono::Utc::now().timestamp_millis();
    let filename = gasoline_paths::sanitize_filename(&format!(
        "shot{}-{stamp}.{}",
        page.replace('/', "-"),
        extension_for(&mime)
    ));

    let screenshots_dir = state.state_dir.join("screenshots");
    let path = screenshots_dir.join(&filename);
    if !gasoline_paths::is_contained_in(&screenshots_dir, &path) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "path_not_allowed"})),
        )
            .into_response();
    }

    if let Err(err) = gasoline_paths::atomic_write(&path, &bytes) {
        tracing::warn!("screenshot write failed: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "write_failed", "detail": err.to_string()})),
        )
            .into_response();
    }

    let correlation_id = request.correlation_id.or(request.query_id);
    Json(json!({
        "filename": filename,
        "path": path.to_string_lossy(),
        "correlation_id": correlation_id,
    }))
    .into_response()
}

#[cfg(test)]
#[path = "screenshots.test.rs"]
mod tests;
