//! Bounded live-feed aggregation
//!
//! One sequential task per invocation: connect, subscribe, collect until the
//! duration budget elapses or the upstream ends, reduce, return. The only
//! scheduling primitive is the receive timeout, always computed from the
//! *remaining* budget so no receive can overrun the overall deadline.

use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::time::{timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use spillwatch_common::ais::{
    parse_feed_message, AggregatedResult, PositionReport, StreamEnd, SubscribeMessage,
    SubscriptionRequest,
};
use spillwatch_common::config::AisConfig;
use spillwatch_common::{reduce, time};

use crate::error::{FeedError, Result};

/// One item of the streaming call surface
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A qualifying position report, forwarded as it arrives
    Report(PositionReport),
    /// Terminal marker: the collection window closed
    Complete(StreamEnd),
}

/// Stream position reports for one bounded collection window.
///
/// Connects to the upstream feed, sends the subscription, and yields each
/// position report as it arrives, stamped with its receive time. The stream
/// always ends with `FeedEvent::Complete` carrying the stop reason, unless
/// the upstream failed before any report arrived, in which case the final
/// item is an error.
///
/// Dropping the stream drops the upstream connection, so a caller that
/// disconnects mid-window releases the socket promptly.
pub fn stream(
    config: AisConfig,
    request: SubscriptionRequest,
) -> impl Stream<Item = Result<FeedEvent>> {
    async_stream::stream! {
        if let Err(e) = request.validate() {
            yield Err(FeedError::InvalidRequest(e.to_string()));
            return;
        }

        let subscribe = SubscribeMessage::new(&config.api_key, &request);
        let payload = match serde_json::to_string(&subscribe) {
            Ok(payload) => payload,
            Err(e) => {
                yield Err(FeedError::Encode(e));
                return;
            }
        };

        // Single best-effort attempt; this is an interactive, bounded-duration
        // feature, so connection failures are fatal rather than retried.
        let (mut upstream, _response) = match connect_async(config.upstream_url.as_str()).await {
            Ok(connected) => connected,
            Err(e) => {
                warn!("Upstream connect failed: {}", e);
                yield Err(FeedError::Connect(e));
                return;
            }
        };
        debug!("Connected to upstream feed at {}", config.upstream_url);

        if let Err(e) = upstream.send(Message::Text(payload)).await {
            warn!("Failed to send subscription: {}", e);
            yield Err(FeedError::Connect(e));
            return;
        }

        let budget = Duration::from_secs(request.duration_secs);
        let deadline = Instant::now() + budget;
        let mut report_count: usize = 0;

        let ended = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break StreamEnd::DeadlineElapsed;
            }

            match timeout(remaining, upstream.next()).await {
                // Remaining budget exhausted while waiting
                Err(_elapsed) => break StreamEnd::DeadlineElapsed,

                // Upstream closed the connection
                Ok(None) => break StreamEnd::UpstreamClosed,
                Ok(Some(Ok(Message::Close(_)))) => break StreamEnd::UpstreamClosed,

                Ok(Some(Ok(Message::Text(text)))) => {
                    // Receipt-time stamping: upstream timestamps are
                    // inconsistently populated and never trusted.
                    if let Some(report) = parse_feed_message(&text, time::now()) {
                        report_count += 1;
                        yield Ok(FeedEvent::Report(report));
                    }
                }

                // Ping/pong/binary frames carry no position data
                Ok(Some(Ok(_))) => {}

                Ok(Some(Err(e))) => {
                    if report_count == 0 {
                        warn!("Upstream stream failed before any data: {}", e);
                        yield Err(FeedError::Interrupted(e.to_string()));
                        return;
                    }
                    // Partial data already collected; degrade to best effort
                    warn!("Upstream stream failed after {} reports: {}", report_count, e);
                    break StreamEnd::UpstreamError(e.to_string());
                }
            }
        };

        debug!("Collection window closed ({:?}) after {} reports", ended, report_count);
        yield Ok(FeedEvent::Complete(ended));
    }
}

/// Collect one bounded window and return the reduced result.
///
/// Blocking call surface over [`stream`]: buffers every qualifying report,
/// then reduces to the latest position per vessel. Zero positions is a valid
/// success, distinct from failure.
pub async fn collect(config: AisConfig, request: SubscriptionRequest) -> Result<AggregatedResult> {
    let events = stream(config, request);
    tokio::pin!(events);

    let mut reports = Vec::new();
    let mut ended = StreamEnd::DeadlineElapsed;
    while let Some(event) = events.next().await {
        match event? {
            FeedEvent::Report(report) => reports.push(report),
            FeedEvent::Complete(reason) => ended = reason,
        }
    }

    Ok(AggregatedResult {
        positions: reduce::latest_positions(reports),
        ended,
    })
}
