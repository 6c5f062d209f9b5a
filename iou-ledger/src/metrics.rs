//! Prometheus metrics for ledger access
//!
//! # Metrics
//!
//! - `iou_ledger_rpc_requests_total` - JSON-RPC requests by method and status
//! - `iou_ledger_rpc_duration_seconds` - JSON-RPC latency by method
//! - `iou_ledger_rpc_retries_total` - Retried reads by method

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static! {
    /// Total JSON-RPC requests
    pub static ref RPC_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "iou_ledger_rpc_requests_total",
        "Total JSON-RPC requests sent to the ledger node",
        &["method", "status"]
    )
    .unwrap();

    /// JSON-RPC request duration
    pub static ref RPC_DURATION: HistogramVec = register_histogram_vec!(
        "iou_ledger_rpc_duration_seconds",
        "JSON-RPC request duration in seconds",
        &["method"],
        vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 5.0]
    )
    .unwrap();

    /// Retried reads
    pub static ref RPC_RETRIES_TOTAL: CounterVec = register_counter_vec!(
        "iou_ledger_rpc_retries_total",
        "Total JSON-RPC read retries after transport failures",
        &["method"]
    )
    .unwrap();
}

/// Record the outcome of one JSON-RPC request
pub fn record_request(method: &str, ok: bool, duration_seconds: f64) {
    let status = if ok { "success" } else { "error" };
    RPC_REQUESTS_TOTAL.with_label_values(&[method, status]).inc();
    RPC_DURATION
        .with_label_values(&[method])
        .observe(duration_seconds);
}
