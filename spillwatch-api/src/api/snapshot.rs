//! Blocking AIS snapshot endpoint
//!
//! The dashboard's collect-then-render mode: one POST runs a full bounded
//! collection window and returns the reduced result.

use axum::extract::State;
use axum::Json;

use spillwatch_common::ais::{AggregatedResult, SubscriptionRequest};

use crate::api::ApiError;
use crate::AppState;

/// POST /api/ais/snapshot
///
/// Runs one bounded collection window and returns the deduplicated latest
/// positions. An empty position list is a normal 200, not an error.
pub async fn ais_snapshot(
    State(state): State<AppState>,
    Json(mut request): Json<SubscriptionRequest>,
) -> Result<Json<AggregatedResult>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    request.clamp_duration();

    let config = state
        .settings
        .ais_config()
        .map_err(|e| ApiError::Unconfigured(e.to_string()))?;

    let result = spillwatch_feed::collect(config, request).await?;
    Ok(Json(result))
}
