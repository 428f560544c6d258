//! Metrics collection and Prometheus exporter for wayfarer-rs.
//!
//! Covers HTTP request counts and latency, upload decisions, committed
//! storage bytes, access denials and issued download links.

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize Prometheus metrics exporter.
///
/// Starts an HTTP server on the given address to expose metrics.
/// Returns an error message if binding fails.
pub fn init_prometheus(listen: &str) -> Result<(), String> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|e| format!("invalid metrics listen address: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install prometheus exporter: {}", e))?;

    Ok(())
}

// ============================================================================
// Metric Names
// ============================================================================

/// Total HTTP requests by route and status.
pub const REQUESTS_TOTAL: &str = "wayfarer_requests_total";
/// HTTP request duration histogram (seconds).
pub const REQUEST_DURATION_SECONDS: &str = "wayfarer_request_duration_seconds";
/// Upload quota decisions by outcome ("allowed", "denied").
pub const UPLOAD_DECISIONS_TOTAL: &str = "wayfarer_upload_decisions_total";
/// Bytes committed to usage counters by direction ("added", "released").
pub const STORAGE_COMMITTED_BYTES_TOTAL: &str = "wayfarer_storage_committed_bytes_total";
/// Usage commits that were clamped at zero.
pub const STORAGE_CLAMPED_TOTAL: &str = "wayfarer_storage_clamped_total";
/// Requests denied by the guard, by reason.
pub const ACCESS_DENIED_TOTAL: &str = "wayfarer_access_denied_total";
/// Signed download links issued.
pub const SIGNED_LINKS_TOTAL: &str = "wayfarer_signed_links_total";
/// Signed blob reads served.
pub const BLOB_READS_TOTAL: &str = "wayfarer_blob_reads_total";
/// Bytes served through signed blob reads.
pub const BLOB_BYTES_SERVED_TOTAL: &str = "wayfarer_blob_bytes_served_total";
/// Requests without a valid bearer token.
pub const AUTH_FAILURE_TOTAL: &str = "wayfarer_auth_failure_total";
/// Total number of errors by type.
pub const ERRORS_TOTAL: &str = "wayfarer_errors_total";

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a completed HTTP request. `route` is the matched route template.
#[inline]
pub fn record_request(route: &str, status: u16) {
    counter!(REQUESTS_TOTAL, "route" => route.to_owned(), "status" => status.to_string())
        .increment(1);
}

/// Record HTTP request duration.
#[inline]
pub fn record_request_duration(route: &str, duration_secs: f64) {
    histogram!(REQUEST_DURATION_SECONDS, "route" => route.to_owned()).record(duration_secs);
}

/// Record an upload quota decision.
#[inline]
pub fn record_upload_decision(allowed: bool) {
    let outcome = if allowed { "allowed" } else { "denied" };
    counter!(UPLOAD_DECISIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a committed usage delta.
#[inline]
pub fn record_storage_committed(delta_bytes: i64) {
    let direction = if delta_bytes >= 0 { "added" } else { "released" };
    counter!(STORAGE_COMMITTED_BYTES_TOTAL, "direction" => direction)
        .increment(delta_bytes.unsigned_abs());
}

/// Record a usage commit clamped at zero.
#[inline]
pub fn record_storage_clamped() {
    counter!(STORAGE_CLAMPED_TOTAL).increment(1);
}

/// Record a guard denial (reason: an error type constant).
#[inline]
pub fn record_access_denied(reason: &'static str) {
    counter!(ACCESS_DENIED_TOTAL, "reason" => reason).increment(1);
}

/// Record an issued download link.
#[inline]
pub fn record_signed_link_issued() {
    counter!(SIGNED_LINKS_TOTAL).increment(1);
}

/// Record a blob served through a signed link.
#[inline]
pub fn record_blob_read(bytes: u64) {
    counter!(BLOB_READS_TOTAL).increment(1);
    counter!(BLOB_BYTES_SERVED_TOTAL).increment(bytes);
}

/// Record failed authentication.
#[inline]
pub fn record_auth_failure() {
    counter!(AUTH_FAILURE_TOTAL).increment(1);
}

/// Record an error by type.
#[inline]
pub fn record_error(error_type: &'static str) {
    counter!(ERRORS_TOTAL, "type" => error_type).increment(1);
}

// ============================================================================
// Error Type Constants (re-exported from wayfarer-core)
// ============================================================================

pub use wayfarer_core::{
    ERROR_CONFIG, ERROR_EXPERIENCE_LIMIT, ERROR_FORBIDDEN, ERROR_NOT_FOUND_OR_FORBIDDEN,
    ERROR_QUOTA_EXCEEDED, ERROR_UNAUTHENTICATED, ERROR_UPSTREAM, ERROR_VALIDATION,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("/api/storage", 200);
        record_request_duration("/api/storage", 0.01);
        record_upload_decision(false);
        record_storage_committed(-42);
        record_access_denied(ERROR_NOT_FOUND_OR_FORBIDDEN);
    }

    #[test]
    fn test_init_prometheus_rejects_bad_address() {
        let err = init_prometheus("not-an-address").unwrap_err();
        assert!(err.contains("invalid metrics listen address"));
    }

    #[test]
    fn test_metric_names_prefixed() {
        for name in [
            REQUESTS_TOTAL,
            REQUEST_DURATION_SECONDS,
            UPLOAD_DECISIONS_TOTAL,
            STORAGE_COMMITTED_BYTES_TOTAL,
            STORAGE_CLAMPED_TOTAL,
            ACCESS_DENIED_TOTAL,
            SIGNED_LINKS_TOTAL,
            ERRORS_TOTAL,
        ] {
            assert!(name.starts_with("wayfarer_"), "{name}");
        }
    }
}
