//! GitHub API error types.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::http::{HttpError, HttpResponse};
use crate::platform::PlatformError;

/// Errors that can occur when interacting with the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("Authentication required")]
    AuthRequired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid file content: {0}")]
    Content(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<GitHubError> for PlatformError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Http(e) => PlatformError::network(e.to_string()),
            GitHubError::Json(e) => PlatformError::decode(e.to_string()),
            GitHubError::Api { status, message } => PlatformError::Api { status, message },
            GitHubError::RateLimited { reset_at } => PlatformError::RateLimited { reset_at },
            GitHubError::AuthRequired => PlatformError::AuthRequired,
            GitHubError::NotFound(resource) => PlatformError::not_found(resource),
            GitHubError::Content(message) => PlatformError::decode(message),
            GitHubError::Url(e) => PlatformError::internal(e.to_string()),
        }
    }
}

/// Map a non-2xx response to an error.
///
/// 403 and 429 only count as rate limiting when GitHub says so through
/// `x-ratelimit-remaining: 0` or a `retry-after` header; any other 403 is
/// a plain API error.
pub(crate) fn classify_response(response: &HttpResponse, resource: &str) -> GitHubError {
    match response.status {
        401 => GitHubError::AuthRequired,
        404 => GitHubError::NotFound(resource.to_string()),
        403 | 429 if is_rate_limit_response(response) => GitHubError::RateLimited {
            reset_at: reset_from_headers(response),
        },
        status => GitHubError::Api {
            status,
            message: error_message(response),
        },
    }
}

fn is_rate_limit_response(response: &HttpResponse) -> bool {
    response.header("x-ratelimit-remaining") == Some("0")
        || response.header("retry-after").is_some()
}

/// `x-ratelimit-reset` is an epoch timestamp; `retry-after` is seconds from now.
///
/// With budget left, the response is a secondary limit and `retry-after` is
/// the wait GitHub asks for, not the primary window reset.
fn reset_from_headers(response: &HttpResponse) -> Option<DateTime<Utc>> {
    let retry_after = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|secs| Utc::now() + Duration::seconds(secs));

    if response.header("x-ratelimit-remaining") != Some("0")
        && let Some(reset_at) = retry_after
    {
        return Some(reset_at);
    }

    response
        .header("x-ratelimit-reset")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|reset| DateTime::from_timestamp(reset, 0))
        .or(retry_after)
}

/// GitHub error bodies carry a `message` field; fall back to the raw body.
fn error_message(response: &HttpResponse) -> String {
    serde_json::from_slice::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| response.body_text())
}
