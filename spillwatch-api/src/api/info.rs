//! Service banner endpoint

use axum::Json;
use serde_json::{json, Value};

/// GET /
///
/// Service banner with the endpoint map, for quick discovery from the
/// dashboard or a browser.
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "message": "Marine Oil Spill Monitoring API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "ais_snapshot": "/api/ais/snapshot",
            "ais_stream": "/api/ais/stream (WebSocket)",
            "predict": "/api/predict",
            "send_alert": "/api/send-alert"
        }
    }))
}
