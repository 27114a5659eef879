//! HTTP routes for the scheduler service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::observability::metrics::http_metrics_middleware;
use crate::services::SchedulingService;
use crate::store::MeetingStore;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sched_core::monitor::LifecycleMonitor;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Canonical persistence store.
    pub store: Arc<dyn MeetingStore>,

    /// Scheduling service (validation, static check, status machine).
    pub service: Arc<SchedulingService>,

    /// Runtime lifecycle monitor.
    pub monitor: Arc<LifecycleMonitor>,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe - public, unversioned
/// - `/ready` - Readiness probe (checks store connectivity)
/// - `/metrics` - Prometheus metrics endpoint
/// - `/api/meetings...` - Scheduling surface
/// - `/api/rooms...`, `/api/participants...` - Resource CRUD
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        // Meetings
        .route(
            "/api/meetings",
            post(handlers::create_meeting).get(handlers::list_meetings),
        )
        .route(
            "/api/meetings/range",
            get(handlers::list_meetings_in_range),
        )
        .route(
            "/api/meetings/status/:status",
            get(handlers::list_meetings_by_status),
        )
        .route(
            "/api/meetings/room/:room_id",
            get(handlers::list_meetings_by_room),
        )
        .route(
            "/api/meetings/verification/stats",
            get(handlers::statistics),
        )
        .route(
            "/api/meetings/verification/violations",
            get(handlers::violations),
        )
        .route(
            "/api/meetings/verification/check-pending",
            post(handlers::check_pending),
        )
        .route(
            "/api/meetings/verification/batch",
            post(handlers::verify_batch),
        )
        .route(
            "/api/meetings/:id",
            get(handlers::get_meeting)
                .put(handlers::update_meeting)
                .delete(handlers::delete_meeting),
        )
        .route("/api/meetings/:id/confirm", post(handlers::confirm_meeting))
        .route("/api/meetings/:id/reject", post(handlers::reject_meeting))
        .route("/api/meetings/:id/cancel", post(handlers::cancel_meeting))
        .route(
            "/api/meetings/:id/complete",
            post(handlers::complete_meeting),
        )
        // Rooms
        .route(
            "/api/rooms",
            post(handlers::create_room).get(handlers::list_rooms),
        )
        .route(
            "/api/rooms/:id",
            get(handlers::get_room)
                .put(handlers::update_room)
                .delete(handlers::delete_room),
        )
        .route(
            "/api/rooms/:id/available-slots",
            get(handlers::available_slots),
        )
        // Participants
        .route(
            "/api/participants",
            post(handlers::create_participant).get(handlers::list_participants),
        )
        .route(
            "/api/participants/:id",
            get(handlers::get_participant)
                .put(handlers::update_participant)
                .delete(handlers::delete_participant),
        )
        // Health check endpoints (unversioned operational endpoints)
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    api_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
