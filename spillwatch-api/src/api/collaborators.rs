//! Proxies to the external collaborators
//!
//! The segmentation predictor and the alert-mail dispatcher are black boxes
//! reached over HTTP; these handlers only forward and relay. Neither is
//! required for the AIS relay to function, so an unconfigured collaborator
//! is a 503 on its own endpoint and nothing else.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::ApiError;
use crate::AppState;

/// Alert dispatch request, forwarded verbatim to the mail collaborator
#[derive(Debug, Serialize, Deserialize)]
pub struct AlertRequest {
    pub sender_email: String,
    pub sender_password: String,
    pub receiver_email: String,
    /// Detected spill coverage, percent
    pub area_percent: f64,
}

/// POST /api/predict
///
/// Forwards the uploaded image body to the predictor service and relays its
/// JSON response (prediction label, coverage percent, overlay raster).
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let url = state
        .settings
        .collaborators
        .predictor_url
        .clone()
        .ok_or_else(|| ApiError::Unconfigured("predictor service not configured".to_string()))?;

    if body.is_empty() {
        return Err(ApiError::BadRequest("empty image body".to_string()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let upstream = state
        .http
        .post(&url)
        .header(reqwest::header::CONTENT_TYPE, content_type)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            warn!("Predictor service unreachable: {}", e);
            ApiError::UpstreamUnavailable(format!("predictor service unreachable: {}", e))
        })?;

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let payload = upstream
        .bytes()
        .await
        .map_err(|e| ApiError::UpstreamUnavailable(format!("predictor response failed: {}", e)))?;

    Ok((
        status,
        [(header::CONTENT_TYPE, "application/json")],
        payload,
    )
        .into_response())
}

/// POST /api/send-alert
///
/// Hands the alert off to the mail-dispatch collaborator and reports it as
/// queued, matching the dashboard's fire-and-confirm flow.
pub async fn send_alert(
    State(state): State<AppState>,
    Json(request): Json<AlertRequest>,
) -> Result<Json<Value>, ApiError> {
    let url = state
        .settings
        .collaborators
        .alert_url
        .clone()
        .ok_or_else(|| ApiError::Unconfigured("alert service not configured".to_string()))?;

    let response = state
        .http
        .post(&url)
        .json(&request)
        .send()
        .await
        .map_err(|e| {
            warn!("Alert service unreachable: {}", e);
            ApiError::UpstreamUnavailable(format!("alert service unreachable: {}", e))
        })?;

    if !response.status().is_success() {
        return Err(ApiError::UpstreamUnavailable(format!(
            "alert service returned {}",
            response.status()
        )));
    }

    info!(
        "Alert queued for {} ({:.2}% coverage)",
        request.receiver_email, request.area_percent
    );
    Ok(Json(json!({
        "message": "Alert email is being sent",
        "status": "queued"
    })))
}
