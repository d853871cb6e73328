//! Integration tests for the bounded live-feed aggregator
//!
//! Each test runs the aggregator against a scripted mock upstream served
//! from an ephemeral local port. Durations are scaled to a few seconds so
//! the deadline behavior is observable without slowing the suite down.

use std::future::Future;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

use spillwatch_common::ais::{StreamEnd, SubscriptionRequest};
use spillwatch_common::config::AisConfig;
use spillwatch_feed::{collect, stream, FeedError, FeedEvent};

type Upstream = WebSocketStream<TcpStream>;

/// Spawn a mock upstream that runs `script` on the first connection.
/// Returns the ws:// URL to connect to.
async fn spawn_upstream<F, Fut>(script: F) -> String
where
    F: FnOnce(Upstream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((socket, _)) = listener.accept().await {
            if let Ok(upstream) = accept_async(socket).await {
                script(upstream).await;
            }
        }
    });
    format!("ws://{}", addr)
}

fn config(upstream_url: String) -> AisConfig {
    AisConfig {
        api_key: "test-key".to_string(),
        upstream_url,
    }
}

fn request(duration_secs: u64) -> SubscriptionRequest {
    SubscriptionRequest {
        duration_secs,
        ..SubscriptionRequest::default()
    }
}

fn position_frame(mmsi: u32, lat: f64, lon: f64) -> Message {
    Message::Text(format!(
        concat!(
            r#"{{"MessageType":"PositionReport","Message":{{"PositionReport":"#,
            r#"{{"UserID":{},"Latitude":{},"Longitude":{},"Sog":9.5,"Cog":120.0,"TrueHeading":118.0}}}}}}"#
        ),
        mmsi, lat, lon
    ))
}

/// Read frames until the subscription message arrives
async fn read_subscription(upstream: &mut Upstream) -> serde_json::Value {
    while let Some(Ok(msg)) = upstream.next().await {
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
    panic!("upstream never received a subscription message");
}

#[tokio::test]
async fn test_subscription_message_reaches_upstream() {
    let (tx, rx) = tokio::sync::oneshot::channel();
    let url = spawn_upstream(|mut upstream| async move {
        let subscription = read_subscription(&mut upstream).await;
        tx.send(subscription).unwrap();
        upstream.close(None).await.ok();
    })
    .await;

    let mut req = request(5);
    req.mmsi_filter = vec!["123456789".to_string()];
    collect(config(url), req).await.unwrap();

    let subscription = rx.await.unwrap();
    assert_eq!(subscription["APIKey"], "test-key");
    assert_eq!(
        subscription["BoundingBoxes"],
        serde_json::json!([[[34.0, -25.0], [71.0, 45.0]]])
    );
    assert_eq!(
        subscription["FiltersShipMMSI"],
        serde_json::json!(["123456789"])
    );
    assert_eq!(
        subscription["FilterMessageTypes"],
        serde_json::json!(["PositionReport"])
    );
}

#[tokio::test]
async fn test_two_vessels_latest_position_wins() {
    // Vessel 123 reports three times, vessel 456 once; the upstream then
    // idles past the deadline. The result holds exactly two entries with the
    // latest fix per vessel, ordered by receive time.
    let url = spawn_upstream(|mut upstream| async move {
        read_subscription(&mut upstream).await;
        upstream.send(position_frame(123, 55.0, 12.0)).await.ok();
        tokio::time::sleep(Duration::from_millis(50)).await;
        upstream.send(position_frame(456, 60.0, 5.0)).await.ok();
        tokio::time::sleep(Duration::from_millis(50)).await;
        upstream.send(position_frame(123, 55.1, 12.05)).await.ok();
        tokio::time::sleep(Duration::from_millis(50)).await;
        upstream.send(position_frame(123, 55.2, 12.1)).await.ok();
        tokio::time::sleep(Duration::from_secs(5)).await;
    })
    .await;

    let result = collect(config(url), request(2)).await.unwrap();

    assert_eq!(result.ended, StreamEnd::DeadlineElapsed);
    assert_eq!(result.positions.len(), 2);
    assert_eq!(result.positions[0].mmsi, 456);
    assert_eq!(result.positions[0].lat, Some(60.0));
    assert_eq!(result.positions[1].mmsi, 123);
    assert_eq!(result.positions[1].lat, Some(55.2));
    assert!(result.positions[0].timestamp <= result.positions[1].timestamp);
}

#[tokio::test]
async fn test_connect_refused_is_fatal() {
    // Bind then drop a listener so the port is known-dead
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = collect(config(format!("ws://{}", addr)), request(5))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Connect(_)));
}

#[tokio::test]
async fn test_silent_upstream_yields_empty_success() {
    let url = spawn_upstream(|mut upstream| async move {
        read_subscription(&mut upstream).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
    })
    .await;

    let started = Instant::now();
    let result = collect(config(url), request(1)).await.unwrap();
    let elapsed = started.elapsed();

    assert!(result.positions.is_empty());
    assert_eq!(result.ended, StreamEnd::DeadlineElapsed);
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_early_clean_close_returns_partial_result_promptly() {
    // Upstream sends one report then closes 10 requested seconds early
    let url = spawn_upstream(|mut upstream| async move {
        read_subscription(&mut upstream).await;
        upstream.send(position_frame(123, 55.0, 12.0)).await.ok();
        upstream.close(None).await.ok();
    })
    .await;

    let started = Instant::now();
    let result = collect(config(url), request(10)).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(result.positions.len(), 1);
    assert_eq!(result.positions[0].mmsi, 123);
    assert_eq!(result.ended, StreamEnd::UpstreamClosed);
    assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_clean_close_before_any_data_is_empty_success() {
    let url = spawn_upstream(|mut upstream| async move {
        read_subscription(&mut upstream).await;
        upstream.close(None).await.ok();
    })
    .await;

    let result = collect(config(url), request(10)).await.unwrap();
    assert!(result.positions.is_empty());
    assert_eq!(result.ended, StreamEnd::UpstreamClosed);
}

#[tokio::test]
async fn test_abrupt_drop_before_any_data_is_fatal() {
    // Dropping the socket without a close handshake surfaces as a stream
    // error; with zero reports buffered that aborts the call.
    let url = spawn_upstream(|mut upstream| async move {
        read_subscription(&mut upstream).await;
        // drop without close frame
    })
    .await;

    let err = collect(config(url), request(10)).await.unwrap_err();
    assert!(matches!(err, FeedError::Interrupted(_)));
}

#[tokio::test]
async fn test_abrupt_drop_after_data_degrades_to_partial_result() {
    let url = spawn_upstream(|mut upstream| async move {
        read_subscription(&mut upstream).await;
        upstream.send(position_frame(123, 55.0, 12.0)).await.ok();
        upstream.flush().await.ok();
        tokio::time::sleep(Duration::from_millis(100)).await;
        // drop without close frame
    })
    .await;

    let result = collect(config(url), request(10)).await.unwrap();
    assert_eq!(result.positions.len(), 1);
    assert!(matches!(result.ended, StreamEnd::UpstreamError(_)));
}

#[tokio::test]
async fn test_deadline_holds_under_flood() {
    // A flooding upstream must not extend the window: the call returns
    // within the budget plus one message-processing slack.
    let url = spawn_upstream(|mut upstream| async move {
        read_subscription(&mut upstream).await;
        let mut lat = 40.0;
        loop {
            lat += 0.0001;
            if upstream.send(position_frame(999, lat, 10.0)).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;

    let started = Instant::now();
    let result = collect(config(url), request(1)).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(result.ended, StreamEnd::DeadlineElapsed);
    assert_eq!(result.positions.len(), 1);
    assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_reports_missing_coordinates_are_excluded() {
    let url = spawn_upstream(|mut upstream| async move {
        read_subscription(&mut upstream).await;
        // No Latitude/Longitude fields at all
        upstream
            .send(Message::Text(
                r#"{"MessageType":"PositionReport","Message":{"PositionReport":{"UserID":111,"Sog":3.0}}}"#
                    .to_string(),
            ))
            .await
            .ok();
        upstream.send(position_frame(222, 58.0, 4.0)).await.ok();
        upstream.close(None).await.ok();
    })
    .await;

    let result = collect(config(url), request(5)).await.unwrap();
    assert_eq!(result.positions.len(), 1);
    assert_eq!(result.positions[0].mmsi, 222);
}

#[tokio::test]
async fn test_non_position_messages_are_ignored() {
    let url = spawn_upstream(|mut upstream| async move {
        read_subscription(&mut upstream).await;
        upstream
            .send(Message::Text(
                r#"{"MessageType":"ShipStaticData","Message":{}}"#.to_string(),
            ))
            .await
            .ok();
        upstream
            .send(Message::Text("not json at all".to_string()))
            .await
            .ok();
        upstream.send(position_frame(333, 45.0, 8.0)).await.ok();
        upstream.close(None).await.ok();
    })
    .await;

    let result = collect(config(url), request(5)).await.unwrap();
    assert_eq!(result.positions.len(), 1);
    assert_eq!(result.positions[0].mmsi, 333);
}

#[tokio::test]
async fn test_invalid_request_fails_before_connecting() {
    // Dead upstream URL: validation must reject the request first
    let err = collect(config("ws://127.0.0.1:9".to_string()), request(0))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_stream_surface_forwards_reports_then_completes() {
    let url = spawn_upstream(|mut upstream| async move {
        read_subscription(&mut upstream).await;
        upstream.send(position_frame(123, 55.0, 12.0)).await.ok();
        upstream.send(position_frame(456, 60.0, 5.0)).await.ok();
        upstream.close(None).await.ok();
    })
    .await;

    let events = stream(config(url), request(5));
    tokio::pin!(events);

    let mut reports = Vec::new();
    let mut ended = None;
    while let Some(event) = events.next().await {
        match event.unwrap() {
            FeedEvent::Report(report) => reports.push(report),
            FeedEvent::Complete(reason) => ended = Some(reason),
        }
    }

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].mmsi, 123);
    assert_eq!(reports[1].mmsi, 456);
    assert_eq!(ended, Some(StreamEnd::UpstreamClosed));
}
