//! Prometheus metrics for the settlement client
//!
//! # Metrics
//!
//! - `iou_scan_blocks_total` - Blocks fetched by history scans
//! - `iou_scan_events_total` - `add_IOU` events kept by history scans
//! - `iou_scan_duration_seconds` - Wall time of complete scans
//! - `iou_balance_lookups_total` - Balance lookups by source (ledger or memo)
//! - `iou_writes_total` - IOU writes by outcome

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

lazy_static! {
    /// Blocks fetched while scanning
    pub static ref SCAN_BLOCKS_TOTAL: IntCounter = register_int_counter!(
        "iou_scan_blocks_total",
        "Total blocks fetched by history scans"
    )
    .unwrap();

    /// Events decoded while scanning
    pub static ref SCAN_EVENTS_TOTAL: IntCounter = register_int_counter!(
        "iou_scan_events_total",
        "Total add_IOU events kept by history scans"
    )
    .unwrap();

    /// Scan duration
    pub static ref SCAN_DURATION: Histogram = register_histogram!(
        "iou_scan_duration_seconds",
        "History scan duration in seconds",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]
    )
    .unwrap();

    /// Balance lookups
    pub static ref BALANCE_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "iou_balance_lookups_total",
        "Total balance lookups by source",
        &["source"]
    )
    .unwrap();

    /// IOU writes
    pub static ref WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "iou_writes_total",
        "Total IOU writes by outcome",
        &["outcome"]
    )
    .unwrap();
}

/// Record the outcome of one IOU write
pub fn record_write(netted: bool, ok: bool) {
    let outcome = match (ok, netted) {
        (false, _) => "failed",
        (true, true) => "netted",
        (true, false) => "plain",
    };
    WRITES_TOTAL.with_label_values(&[outcome]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_write() {
        let before = WRITES_TOTAL.with_label_values(&["netted"]).get();

        record_write(true, true);

        // Other tests may write concurrently
        assert!(WRITES_TOTAL.with_label_values(&["netted"]).get() > before);
    }
}
