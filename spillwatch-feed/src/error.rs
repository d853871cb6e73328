//! Feed aggregation error types
//!
//! Only failures that occur before any data has been received surface as
//! errors. Anything after the first buffered report degrades to a partial
//! result, reported through `StreamEnd` on a successful return.

use thiserror::Error;

/// Result type for feed aggregation calls
pub type Result<T> = std::result::Result<T, FeedError>;

/// Errors that abort an aggregation call
#[derive(Debug, Error)]
pub enum FeedError {
    /// Upstream unreachable or subscription handshake failed. Fatal; no
    /// partial result exists.
    #[error("failed to connect to upstream feed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    /// The stream failed before any position report arrived
    #[error("upstream stream failed before any data arrived: {0}")]
    Interrupted(String),

    /// The subscription request failed validation
    #[error("invalid subscription request: {0}")]
    InvalidRequest(String),

    /// The subscription message could not be encoded
    #[error("failed to encode subscription message: {0}")]
    Encode(#[from] serde_json::Error),
}
