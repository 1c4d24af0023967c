// 两个服务共用的handler片段
use super::error::ApiError;
use super::state::IntervalControl;
use crate::config::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};
use axum::Json;
use axum::extract::{FromRequestParts, Query};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use log::info;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub const MIN_QUERY_CHARS: usize = 2;

pub fn cron_expression(secs: u64) -> String {
    format!("*/{} * * * * *", secs)
}

pub fn calls_per_minute(secs: u64) -> u64 {
    (60.0 / secs.max(1) as f64).round() as u64
}

pub fn take<T: Clone>(items: &[T], limit: usize) -> Vec<T> {
    items.iter().take(limit).cloned().collect()
}

pub fn check_query(query: &str) -> Result<(), ApiError> {
    if query.trim().chars().count() < MIN_QUERY_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Query must be at least {} characters long",
            MIN_QUERY_CHARS
        )));
    }
    Ok(())
}

/// Parse a JSON body by hand so malformed input gets the same error shape as
/// every other 400.
pub fn parse_body<T: DeserializeOwned>(body: &[u8], message: &str) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::BadRequest(message.to_string()))
}

/// `Query<T>` whose rejection renders as an [`ApiError`] instead of plain text.
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|e| ApiError::BadRequest(e.body_text()))
    }
}

#[derive(Debug, Deserialize)]
struct IntervalRequest {
    seconds: Option<Value>,
}

pub fn update_interval(service: &str, interval: &IntervalControl, body: &[u8]) -> Response {
    let seconds = serde_json::from_slice::<IntervalRequest>(body)
        .ok()
        .and_then(|r| r.seconds)
        .and_then(|v| v.as_u64())
        .filter(|s| (MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(s));

    let Some(seconds) = seconds else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": format!(
                    "Interval must be between {} and {} seconds",
                    MIN_INTERVAL_SECS, MAX_INTERVAL_SECS
                ),
                "current_interval": interval.current(),
            })),
        )
            .into_response();
    };

    let old = interval.set(seconds);
    info!("[{}] interval changed from {}s to {}s", service, old, seconds);
    Json(json!({
        "success": true,
        "message": "Interval updated successfully",
        "old_interval": old,
        "new_interval": seconds,
        "cron_expression": cron_expression(seconds),
        "note": "Applies from the next polling tick",
    }))
    .into_response()
}
