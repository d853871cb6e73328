//! Duplex AIS relay endpoint
//!
//! WebSocket protocol: the client sends one SubscriptionRequest JSON text
//! frame; the server relays each qualifying position report as its own JSON
//! frame, then a terminal `{"status": "complete", "reason": ...}` marker —
//! or `{"error": ...}` if the upstream failed before any data arrived.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::StreamExt;
use serde_json::json;
use tracing::{debug, info, warn};

use spillwatch_common::ais::SubscriptionRequest;
use spillwatch_feed::FeedEvent;

use crate::AppState;

/// WebSocket upgrade handler for GET /api/ais/stream
pub async fn ais_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_relay(socket, state))
}

/// Run one relay session over an accepted socket
async fn handle_relay(mut socket: WebSocket, state: AppState) {
    info!("AIS relay client connected");

    // First text frame carries the subscription request
    let mut request = loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<SubscriptionRequest>(&text) {
                Ok(request) => break request,
                Err(e) => {
                    send_error(&mut socket, &format!("invalid subscription request: {}", e)).await;
                    return;
                }
            },
            Some(Ok(Message::Close(_))) | None => {
                debug!("Relay client left before subscribing");
                return;
            }
            // Ping/pong are handled by axum; binary frames carry no request
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                warn!("Relay socket error before subscription: {}", e);
                return;
            }
        }
    };

    if let Err(e) = request.validate() {
        send_error(&mut socket, &e.to_string()).await;
        return;
    }
    request.clamp_duration();

    let config = match state.settings.ais_config() {
        Ok(config) => config,
        Err(e) => {
            send_error(&mut socket, &e.to_string()).await;
            return;
        }
    };

    debug!(
        "Starting relay window: bbox [{}, {}] x [{}, {}], {}s",
        request.min_lat, request.max_lat, request.min_lon, request.max_lon, request.duration_secs
    );

    let events = spillwatch_feed::stream(config, request);
    tokio::pin!(events);

    while let Some(event) = events.next().await {
        match event {
            Ok(FeedEvent::Report(report)) => {
                let frame = match serde_json::to_string(&report) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Failed to encode position report: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(frame)).await.is_err() {
                    // Client left; dropping the event stream releases the
                    // upstream connection
                    debug!("Relay client disconnected mid-window");
                    return;
                }
            }
            Ok(FeedEvent::Complete(reason)) => {
                let marker = json!({"status": "complete", "reason": reason});
                let _ = socket.send(Message::Text(marker.to_string())).await;
            }
            Err(e) => {
                send_error(&mut socket, &e.to_string()).await;
                return;
            }
        }
    }

    let _ = socket.send(Message::Close(None)).await;
    info!("AIS relay session complete");
}

async fn send_error(socket: &mut WebSocket, message: &str) {
    let marker = json!({"error": message});
    let _ = socket.send(Message::Text(marker.to_string())).await;
    let _ = socket.send(Message::Close(None)).await;
}
