//! Meeting handlers.
//!
//! Implements the meeting endpoints:
//!
//! - `POST /api/meetings` - Schedule a meeting (201 admitted / 409 refused)
//! - `GET /api/meetings` - List meetings
//! - `GET /api/meetings/{id}` - Fetch one meeting
//! - `GET /api/meetings/status/{status}` - List by status
//! - `GET /api/meetings/room/{room_id}` - List by room
//! - `GET /api/meetings/range?start&end` - List by interval overlap
//! - `PUT /api/meetings/{id}` - Update a meeting (200 / 409)
//! - `DELETE /api/meetings/{id}` - Delete a meeting (204 / 409)
//! - `POST /api/meetings/{id}/{confirm|reject|cancel|complete}` - Transition
//! - `POST /api/meetings/verification/batch` - Verify a batch of proposals

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use sched_core::model::{Meeting, MeetingStatus};
use sched_core::report::SchedulingResult;

use crate::errors::SchedulerError;
use crate::models::{BatchVerifyRequest, MeetingRequest, RangeQuery, UpdateMeetingRequest};
use crate::routes::AppState;

/// Status code for a scheduling report: 409 when the verification core
/// refused, the given success code otherwise.
fn report_status(result: &SchedulingResult, on_success: StatusCode) -> StatusCode {
    if result.success {
        on_success
    } else {
        StatusCode::CONFLICT
    }
}

/// Handler for POST /api/meetings
///
/// # Response
///
/// - 201 Created: meeting admitted and persisted as PENDING
/// - 409 Conflict: static check refused; the body carries the witnesses
/// - 400 Bad Request: malformed body
/// - 404 Not Found: unknown room or participant
#[instrument(
    skip_all,
    name = "sched.meeting.create",
    fields(method = "POST", endpoint = "/api/meetings")
)]
pub async fn create_meeting(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<SchedulingResult>), SchedulerError> {
    // Deserialize manually to return 400 (not Axum's default 422).
    let request: MeetingRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "sched.handlers.meetings", error = %e, "Invalid request body");
        SchedulerError::InvalidArgument("Invalid request body".to_string())
    })?;

    let result = state.service.create_meeting(request).await?;
    let status = report_status(&result, StatusCode::CREATED);
    Ok((status, Json(result)))
}

/// Handler for GET /api/meetings/{id}
#[instrument(
    skip_all,
    name = "sched.meeting.get",
    fields(method = "GET", endpoint = "/api/meetings/{id}")
)]
pub async fn get_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<Meeting>, SchedulerError> {
    Ok(Json(state.service.get_meeting(meeting_id).await?))
}

/// Handler for GET /api/meetings
#[instrument(
    skip_all,
    name = "sched.meeting.list",
    fields(method = "GET", endpoint = "/api/meetings")
)]
pub async fn list_meetings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Meeting>>, SchedulerError> {
    Ok(Json(state.store.list_meetings().await?))
}

/// Handler for GET /api/meetings/status/{status}
#[instrument(
    skip_all,
    name = "sched.meeting.list_by_status",
    fields(method = "GET", endpoint = "/api/meetings/status/{status}")
)]
pub async fn list_meetings_by_status(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
) -> Result<Json<Vec<Meeting>>, SchedulerError> {
    let status = MeetingStatus::parse(&status).ok_or_else(|| {
        SchedulerError::InvalidArgument(format!("Unknown meeting status '{}'", status))
    })?;
    Ok(Json(state.store.meetings_by_status(status).await?))
}

/// Handler for GET /api/meetings/room/{room_id}
#[instrument(
    skip_all,
    name = "sched.meeting.list_by_room",
    fields(method = "GET", endpoint = "/api/meetings/room/{room_id}")
)]
pub async fn list_meetings_by_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<Meeting>>, SchedulerError> {
    Ok(Json(state.store.meetings_by_room(room_id).await?))
}

/// Handler for GET /api/meetings/range?start&end
#[instrument(
    skip_all,
    name = "sched.meeting.list_in_range",
    fields(method = "GET", endpoint = "/api/meetings/range")
)]
pub async fn list_meetings_in_range(
    State(state): State<Arc<AppState>>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Meeting>>, SchedulerError> {
    if range.start >= range.end {
        return Err(SchedulerError::InvalidArgument(
            "Range start must precede its end".to_string(),
        ));
    }
    Ok(Json(
        state.store.meetings_in_range(range.start, range.end).await?,
    ))
}

/// Handler for PUT /api/meetings/{id}
///
/// # Response
///
/// - 200 OK: delta admitted and persisted
/// - 409 Conflict: static check refused the overlaid meeting
/// - 400 Bad Request: malformed body or terminal status
#[instrument(
    skip_all,
    name = "sched.meeting.update",
    fields(method = "PUT", endpoint = "/api/meetings/{id}")
)]
pub async fn update_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<Uuid>,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<SchedulingResult>), SchedulerError> {
    let delta: UpdateMeetingRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "sched.handlers.meetings", error = %e, "Invalid request body");
        SchedulerError::InvalidArgument("Invalid request body".to_string())
    })?;

    let result = state.service.update_meeting(meeting_id, delta).await?;
    let status = report_status(&result, StatusCode::OK);
    Ok((status, Json(result)))
}

/// Handler for DELETE /api/meetings/{id}
///
/// # Response
///
/// - 204 No Content: deleted
/// - 409 Conflict: refused by the runtime monitor
/// - 404 Not Found: unknown meeting
#[instrument(
    skip_all,
    name = "sched.meeting.delete",
    fields(method = "DELETE", endpoint = "/api/meetings/{id}")
)]
pub async fn delete_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<Uuid>,
) -> Result<StatusCode, SchedulerError> {
    state.service.delete_meeting(meeting_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /api/meetings/{id}/confirm
#[instrument(
    skip_all,
    name = "sched.meeting.confirm",
    fields(method = "POST", endpoint = "/api/meetings/{id}/confirm")
)]
pub async fn confirm_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<Meeting>, SchedulerError> {
    Ok(Json(
        state
            .service
            .transition(meeting_id, MeetingStatus::Confirmed)
            .await?,
    ))
}

/// Handler for POST /api/meetings/{id}/reject
#[instrument(
    skip_all,
    name = "sched.meeting.reject",
    fields(method = "POST", endpoint = "/api/meetings/{id}/reject")
)]
pub async fn reject_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<Meeting>, SchedulerError> {
    Ok(Json(
        state
            .service
            .transition(meeting_id, MeetingStatus::Rejected)
            .await?,
    ))
}

/// Handler for POST /api/meetings/{id}/cancel
#[instrument(
    skip_all,
    name = "sched.meeting.cancel",
    fields(method = "POST", endpoint = "/api/meetings/{id}/cancel")
)]
pub async fn cancel_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<Meeting>, SchedulerError> {
    Ok(Json(
        state
            .service
            .transition(meeting_id, MeetingStatus::Cancelled)
            .await?,
    ))
}

/// Handler for POST /api/meetings/{id}/complete
#[instrument(
    skip_all,
    name = "sched.meeting.complete",
    fields(method = "POST", endpoint = "/api/meetings/{id}/complete")
)]
pub async fn complete_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<Meeting>, SchedulerError> {
    Ok(Json(
        state
            .service
            .transition(meeting_id, MeetingStatus::Completed)
            .await?,
    ))
}

/// Handler for POST /api/meetings/verification/batch
///
/// Planning query: checks the proposals jointly against the confirmed
/// snapshot without persisting anything.
#[instrument(
    skip_all,
    name = "sched.meeting.verify_batch",
    fields(method = "POST", endpoint = "/api/meetings/verification/batch")
)]
pub async fn verify_batch(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<Json<SchedulingResult>, SchedulerError> {
    let request: BatchVerifyRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "sched.handlers.meetings", error = %e, "Invalid request body");
        SchedulerError::InvalidArgument("Invalid request body".to_string())
    })?;

    Ok(Json(state.service.verify_batch(request.proposals).await?))
}
