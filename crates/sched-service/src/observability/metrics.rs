//! Metrics definitions for the scheduler service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sched_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: standard HTTP verbs
//! - `endpoint`: parameterized paths (dynamic segments replaced)
//! - `status`: success / error / timeout
//! - `outcome`: satisfiable / unsatisfiable / error
//! - `property`, `severity`: bounded by the monitor's catalogue

use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::{Duration, Instant};

/// Initialize Prometheus metrics recorder and return the handle for
/// serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("sched_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Decision-backend calls are sub-millisecond for the direct
        // checker; wide upper buckets cover an SMT-backed replacement.
        .set_buckets_for_metric(
            Matcher::Prefix("sched_decision".to_string()),
            &[
                0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500, 1.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set decision buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `sched_http_requests_total`, `sched_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("sched_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("sched_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Middleware recording every HTTP response, including framework-level
/// errors like 400, 404 and 405.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed(),
    );
    response
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion.
///
/// Replaces dynamic segments (UUIDs, status names) with placeholders.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/" | "/health" | "/ready" | "/metrics" | "/api/meetings" | "/api/rooms"
        | "/api/participants" => path.to_string(),
        "/api/meetings/verification/stats"
        | "/api/meetings/verification/violations"
        | "/api/meetings/verification/check-pending"
        | "/api/meetings/verification/batch"
        | "/api/meetings/range" => path.to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

/// Normalize paths with dynamic segments.
fn normalize_dynamic_endpoint(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();

    if path.starts_with("/api/meetings/status/") && parts.len() == 5 {
        return "/api/meetings/status/{status}".to_string();
    }

    if path.starts_with("/api/meetings/room/") && parts.len() == 5 {
        return "/api/meetings/room/{room_id}".to_string();
    }

    if path.starts_with("/api/meetings/") {
        // /api/meetings/{id}
        if parts.len() == 4 {
            return "/api/meetings/{id}".to_string();
        }
        // /api/meetings/{id}/confirm | reject | cancel | complete
        if parts.len() == 5 {
            if let Some(action) = parts.get(4) {
                if matches!(*action, "confirm" | "reject" | "cancel" | "complete") {
                    return format!("/api/meetings/{{id}}/{}", action);
                }
            }
        }
    }

    if path.starts_with("/api/rooms/") {
        if parts.len() == 4 {
            return "/api/rooms/{id}".to_string();
        }
        if parts.len() == 5 {
            if let Some(action) = parts.get(4) {
                if *action == "available-slots" {
                    return "/api/rooms/{id}/available-slots".to_string();
                }
            }
        }
    }

    if path.starts_with("/api/participants/") && parts.len() == 4 {
        return "/api/participants/{id}".to_string();
    }

    // Unknown paths normalized to "/other" to bound cardinality
    "/other".to_string()
}

// ============================================================================
// Decision Backend Metrics
// ============================================================================

/// Record a decision-backend call.
///
/// Metric: `sched_decision_duration_seconds`, `sched_decisions_total`
/// Labels: `outcome` (satisfiable / unsatisfiable / error)
pub fn record_decision(outcome: &str, duration: Duration) {
    histogram!("sched_decision_duration_seconds",
        "outcome" => outcome.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("sched_decisions_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// Monitor Metrics
// ============================================================================

/// Record a newly raised monitor violation.
///
/// Metric: `sched_monitor_violations_total`
/// Labels: `property`, `severity`
pub fn record_violation(property: &str, severity: &str) {
    counter!("sched_monitor_violations_total",
        "property" => property.to_string(),
        "severity" => severity.to_string()
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(201), "success");
        assert_eq!(categorize_status_code(404), "error");
        assert_eq!(categorize_status_code(409), "error");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(500), "error");
    }

    #[test]
    fn test_normalize_static_paths() {
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/api/meetings"), "/api/meetings");
        assert_eq!(
            normalize_endpoint("/api/meetings/verification/stats"),
            "/api/meetings/verification/stats"
        );
    }

    #[test]
    fn test_normalize_meeting_id_paths() {
        assert_eq!(
            normalize_endpoint("/api/meetings/7e9a1b34-0000-0000-0000-000000000000"),
            "/api/meetings/{id}"
        );
        assert_eq!(
            normalize_endpoint("/api/meetings/7e9a1b34-0000-0000-0000-000000000000/confirm"),
            "/api/meetings/{id}/confirm"
        );
        assert_eq!(
            normalize_endpoint("/api/meetings/status/pending"),
            "/api/meetings/status/{status}"
        );
        assert_eq!(
            normalize_endpoint("/api/meetings/room/7e9a1b34-0000-0000-0000-000000000000"),
            "/api/meetings/room/{room_id}"
        );
    }

    #[test]
    fn test_normalize_room_paths() {
        assert_eq!(
            normalize_endpoint("/api/rooms/7e9a1b34-0000-0000-0000-000000000000"),
            "/api/rooms/{id}"
        );
        assert_eq!(
            normalize_endpoint(
                "/api/rooms/7e9a1b34-0000-0000-0000-000000000000/available-slots"
            ),
            "/api/rooms/{id}/available-slots"
        );
    }

    #[test]
    fn test_normalize_unknown_to_other() {
        assert_eq!(normalize_endpoint("/internal/debug/dump"), "/other");
        assert_eq!(
            normalize_endpoint("/api/meetings/x/y/z/deep"),
            "/other"
        );
    }
}
