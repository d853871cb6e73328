//! spillwatch-api library - HTTP/WebSocket front-end
//!
//! Serves the AIS relay (duplex stream and blocking snapshot), the health
//! endpoint, and thin proxies to the external predictor and alert-mail
//! collaborators.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use spillwatch_common::config::Settings;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Service settings (AIS credential, collaborator endpoints)
    pub settings: Arc<Settings>,
    /// HTTP client for collaborator proxies
    pub http: reqwest::Client,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            http: reqwest::Client::new(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    // CORS for the dashboard origin; fall back to permissive if the
    // configured origin is not a valid header value
    let cors = match state.settings.server.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => CorsLayer::permissive(),
    };

    Router::new()
        .route("/", get(api::service_info))
        .merge(api::health_routes())
        .route("/api/ais/snapshot", post(api::ais_snapshot))
        .route("/api/ais/stream", get(api::ais_stream))
        .route("/api/predict", post(api::predict))
        .route("/api/send-alert", post(api::send_alert))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
