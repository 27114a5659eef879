//! Health and metrics handlers.

use axum::{extract::State, http::StatusCode, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::routes::AppState;

/// Handler for GET /health
///
/// Liveness probe: the process is up and serving.
#[instrument(skip_all, name = "sched.health.live")]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        database: None,
    })
}

/// Handler for GET /ready
///
/// Readiness probe: verifies store connectivity.
#[instrument(skip_all, name = "sched.health.ready")]
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                database: Some("healthy".to_string()),
            }),
        ),
        Err(err) => {
            tracing::warn!(target: "sched.health", error = %err, "Store ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    database: Some("unhealthy".to_string()),
                }),
            )
        }
    }
}

/// Handler for GET /metrics
///
/// Renders the Prometheus exposition text.
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
