//! Verification read surface.
//!
//! Exposes the runtime monitor for inspection:
//!
//! - `GET /api/meetings/verification/stats` - Aggregate counters
//! - `GET /api/meetings/verification/violations` - Violation log
//! - `POST /api/meetings/verification/check-pending` - Run the pending sweep

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use sched_core::monitor::{MonitorStatistics, PropertyViolation, Severity};

use crate::errors::SchedulerError;
use crate::routes::AppState;

/// Optional severity filter for the violations listing.
#[derive(Debug, Deserialize)]
pub struct ViolationsQuery {
    #[serde(default)]
    pub severity: Option<String>,
}

/// Handler for GET /api/meetings/verification/stats
#[instrument(
    skip_all,
    name = "sched.verification.stats",
    fields(method = "GET", endpoint = "/api/meetings/verification/stats")
)]
pub async fn statistics(State(state): State<Arc<AppState>>) -> Json<MonitorStatistics> {
    Json(state.monitor.statistics())
}

/// Handler for GET /api/meetings/verification/violations
#[instrument(
    skip_all,
    name = "sched.verification.violations",
    fields(method = "GET", endpoint = "/api/meetings/verification/violations")
)]
pub async fn violations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViolationsQuery>,
) -> Result<Json<Vec<PropertyViolation>>, SchedulerError> {
    let violations = match query.severity {
        Some(raw) => {
            let severity = Severity::parse(&raw).ok_or_else(|| {
                SchedulerError::InvalidArgument(format!("Unknown severity '{}'", raw))
            })?;
            state.monitor.violations_by_severity(severity)
        }
        None => state.monitor.violations(),
    };
    Ok(Json(violations))
}

/// Handler for POST /api/meetings/verification/check-pending
///
/// Runs the pending sweep against the wall clock and returns the newly
/// raised violations.
#[instrument(
    skip_all,
    name = "sched.verification.check_pending",
    fields(method = "POST", endpoint = "/api/meetings/verification/check-pending")
)]
pub async fn check_pending(State(state): State<Arc<AppState>>) -> Json<Vec<PropertyViolation>> {
    Json(state.monitor.check_pending(Utc::now()))
}
