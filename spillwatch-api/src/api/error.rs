//! API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use spillwatch_feed::FeedError;

/// Handler-level errors mapped to HTTP statuses
#[derive(Debug)]
pub enum ApiError {
    /// Request failed validation (400)
    BadRequest(String),
    /// A required collaborator or credential is not configured (503)
    Unconfigured(String),
    /// The upstream feed or a collaborator could not be reached (502)
    UpstreamUnavailable(String),
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unconfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::UpstreamUnavailable(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            FeedError::Connect(_) | FeedError::Interrupted(_) => {
                ApiError::UpstreamUnavailable(err.to_string())
            }
            FeedError::Encode(_) => ApiError::Internal(err.to_string()),
        }
    }
}
