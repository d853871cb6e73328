//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
///
/// Used for receipt-time stamping of position reports; upstream-supplied
/// timestamps are never trusted.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
