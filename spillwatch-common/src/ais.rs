//! AIS data model and upstream wire format
//!
//! Request/response types shared by the feed aggregator and the HTTP
//! front-end, plus the aisstream.io subscribe message and inbound envelope
//! shapes. Field names on the wire follow the upstream service exactly
//! (`APIKey`, `BoundingBoxes`, `UserID`, ...); caller-facing JSON uses the
//! lowercase names the dashboard consumes (`mmsi`, `lat`, `lon`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Minimum duration budget accepted from callers (seconds)
pub const MIN_DURATION_SECS: u64 = 5;
/// Maximum duration budget accepted from callers (seconds)
pub const MAX_DURATION_SECS: u64 = 60;

/// Caller-specified filter for one aggregation call.
///
/// Defaults cover European waters, matching the dashboard's region-of-interest
/// presets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    #[serde(default = "default_min_lat")]
    pub min_lat: f64,
    #[serde(default = "default_max_lat")]
    pub max_lat: f64,
    #[serde(default = "default_min_lon")]
    pub min_lon: f64,
    #[serde(default = "default_max_lon")]
    pub max_lon: f64,

    /// Optional vessel MMSI filter. Entries are strings on the wire.
    #[serde(default)]
    pub mmsi_filter: Vec<String>,

    /// Duration budget for the collection window, in seconds
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
}

fn default_min_lat() -> f64 {
    34.0
}

fn default_max_lat() -> f64 {
    71.0
}

fn default_min_lon() -> f64 {
    -25.0
}

fn default_max_lon() -> f64 {
    45.0
}

fn default_duration_secs() -> u64 {
    15
}

impl Default for SubscriptionRequest {
    fn default() -> Self {
        Self {
            min_lat: default_min_lat(),
            max_lat: default_max_lat(),
            min_lon: default_min_lon(),
            max_lon: default_max_lon(),
            mmsi_filter: Vec::new(),
            duration_secs: default_duration_secs(),
        }
    }
}

impl SubscriptionRequest {
    /// Validate coordinate ranges, axis ordering, and duration.
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.min_lat) || !(-90.0..=90.0).contains(&self.max_lat) {
            return Err(Error::InvalidInput(
                "latitude must be within [-90, 90]".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.min_lon) || !(-180.0..=180.0).contains(&self.max_lon) {
            return Err(Error::InvalidInput(
                "longitude must be within [-180, 180]".to_string(),
            ));
        }
        if self.min_lat > self.max_lat {
            return Err(Error::InvalidInput(
                "min_lat must not exceed max_lat".to_string(),
            ));
        }
        if self.min_lon > self.max_lon {
            return Err(Error::InvalidInput(
                "min_lon must not exceed max_lon".to_string(),
            ));
        }
        if self.duration_secs == 0 {
            return Err(Error::InvalidInput(
                "duration_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Clamp the duration budget to the range callers are allowed to request.
    ///
    /// Applied at the front-end boundary; the feed library itself only
    /// requires a positive duration.
    pub fn clamp_duration(&mut self) {
        self.duration_secs = self.duration_secs.clamp(MIN_DURATION_SECS, MAX_DURATION_SECS);
    }

    /// Bounding box in upstream order: `[[min_lat, min_lon], [max_lat, max_lon]]`
    pub fn bounding_box(&self) -> [[f64; 2]; 2] {
        [[self.min_lat, self.min_lon], [self.max_lat, self.max_lon]]
    }
}

/// A single vessel location/kinematics update from the live feed.
///
/// `timestamp` is the *receive* time, stamped locally when the report
/// arrives. Upstream timestamp fields are inconsistently populated and are
/// never trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub timestamp: DateTime<Utc>,
    /// Vessel MMSI
    pub mmsi: u32,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Speed over ground, knots
    pub sog: Option<f64>,
    /// Course over ground, degrees
    pub cog: Option<f64>,
    pub true_heading: Option<f64>,
}

/// Why a collection window stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEnd {
    /// The duration budget elapsed
    DeadlineElapsed,
    /// The upstream feed closed the connection cleanly
    UpstreamClosed,
    /// The upstream feed failed after partial data was collected
    UpstreamError(String),
}

/// Deduplicated, filtered set of latest-known positions from one bounded
/// collection window, plus the reason the window closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub positions: Vec<PositionReport>,
    pub ended: StreamEnd,
}

/// Subscription message sent to the upstream feed after connecting.
///
/// Key names follow the aisstream.io protocol.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeMessage {
    #[serde(rename = "APIKey")]
    pub api_key: String,
    #[serde(rename = "BoundingBoxes")]
    pub bounding_boxes: Vec<[[f64; 2]; 2]>,
    #[serde(rename = "FiltersShipMMSI", skip_serializing_if = "Option::is_none")]
    pub filters_ship_mmsi: Option<Vec<String>>,
    #[serde(rename = "FilterMessageTypes")]
    pub filter_message_types: Vec<String>,
}

impl SubscribeMessage {
    /// Build the subscribe message for one aggregation call.
    ///
    /// Always restricts to PositionReport messages to reduce upstream volume.
    pub fn new(api_key: &str, request: &SubscriptionRequest) -> Self {
        let filters_ship_mmsi = if request.mmsi_filter.is_empty() {
            None
        } else {
            Some(request.mmsi_filter.clone())
        };
        Self {
            api_key: api_key.to_string(),
            bounding_boxes: vec![request.bounding_box()],
            filters_ship_mmsi,
            filter_message_types: vec!["PositionReport".to_string()],
        }
    }
}

/// Inbound upstream message envelope
#[derive(Debug, Deserialize)]
pub struct FeedEnvelope {
    #[serde(rename = "MessageType")]
    pub message_type: String,
    #[serde(rename = "Message", default)]
    pub message: Option<FeedMessage>,
}

/// Payload container inside the envelope
#[derive(Debug, Deserialize)]
pub struct FeedMessage {
    #[serde(rename = "PositionReport")]
    pub position_report: Option<RawPositionReport>,
}

/// Position report as the upstream feed encodes it
#[derive(Debug, Deserialize)]
pub struct RawPositionReport {
    #[serde(rename = "UserID")]
    pub user_id: Option<u32>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(rename = "Sog")]
    pub sog: Option<f64>,
    #[serde(rename = "Cog")]
    pub cog: Option<f64>,
    #[serde(rename = "TrueHeading")]
    pub true_heading: Option<f64>,
}

/// Parse one upstream text frame into a position report.
///
/// Returns `None` for non-position message types, frames that fail JSON
/// parsing, and reports with no vessel identifier. The report is stamped
/// with `received_at`, never with any upstream-supplied time.
pub fn parse_feed_message(text: &str, received_at: DateTime<Utc>) -> Option<PositionReport> {
    let envelope: FeedEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!("Skipping unparseable upstream frame: {}", e);
            return None;
        }
    };

    if envelope.message_type != "PositionReport" {
        return None;
    }

    let raw = envelope.message?.position_report?;
    let mmsi = raw.user_id?;

    Some(PositionReport {
        timestamp: received_at,
        mmsi,
        lat: raw.latitude,
        lon: raw.longitude,
        sog: raw.sog,
        cog: raw.cog,
        true_heading: raw.true_heading,
    })
}
