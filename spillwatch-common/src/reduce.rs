//! Position report reduction
//!
//! Reduces a buffered collection window to the latest-known position per
//! vessel: stable sort by timestamp, drop reports missing coordinates, keep
//! the last-seen report per MMSI.

use std::collections::HashMap;

use crate::ais::PositionReport;

/// Reduce buffered reports to at most one entry per vessel.
///
/// Later timestamps win on duplicate MMSIs; when timestamps tie, the report
/// buffered later wins (the sort is stable). Reports missing latitude or
/// longitude are dropped. The returned sequence is ordered by timestamp.
///
/// The reduction is idempotent: applying it to its own output is a no-op.
pub fn latest_positions(mut reports: Vec<PositionReport>) -> Vec<PositionReport> {
    reports.sort_by_key(|r| r.timestamp);

    let mut latest: HashMap<u32, PositionReport> = HashMap::new();
    for report in reports {
        if report.lat.is_none() || report.lon.is_none() {
            continue;
        }
        latest.insert(report.mmsi, report);
    }

    let mut positions: Vec<PositionReport> = latest.into_values().collect();
    positions.sort_by_key(|r| r.timestamp);
    positions
}
