//! Room handlers.
//!
//! CRUD under `/api/rooms` plus the availability finder. Room contents are
//! data only; the verification core sees rooms through the scheduling
//! service.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use sched_core::model::Room;

use crate::errors::SchedulerError;
use crate::models::{AvailabilityQuery, AvailableSlot, RoomRequest, UpdateRoomRequest};
use crate::routes::AppState;

/// Handler for POST /api/rooms
#[instrument(
    skip_all,
    name = "sched.room.create",
    fields(method = "POST", endpoint = "/api/rooms")
)]
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<Room>), SchedulerError> {
    let request: RoomRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "sched.handlers.rooms", error = %e, "Invalid request body");
        SchedulerError::InvalidArgument("Invalid request body".to_string())
    })?;
    request
        .validate()
        .map_err(|e| SchedulerError::InvalidArgument(e.to_string()))?;

    let room = Room {
        room_id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        capacity: request.capacity,
        location: request.location,
        description: request.description,
        available: request.available.unwrap_or(true),
    };
    let created = state.store.insert_room(room).await?;

    info!(
        target: "sched.handlers.rooms",
        room_id = %created.room_id,
        name = %created.name,
        "Room created"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for GET /api/rooms/{id}
#[instrument(
    skip_all,
    name = "sched.room.get",
    fields(method = "GET", endpoint = "/api/rooms/{id}")
)]
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Room>, SchedulerError> {
    let room = state
        .store
        .get_room(room_id)
        .await?
        .ok_or_else(|| SchedulerError::NotFound("Room not found".to_string()))?;
    Ok(Json(room))
}

/// Handler for GET /api/rooms
#[instrument(
    skip_all,
    name = "sched.room.list",
    fields(method = "GET", endpoint = "/api/rooms")
)]
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Room>>, SchedulerError> {
    Ok(Json(state.store.list_rooms().await?))
}

/// Handler for PUT /api/rooms/{id}
#[instrument(
    skip_all,
    name = "sched.room.update",
    fields(method = "PUT", endpoint = "/api/rooms/{id}")
)]
pub async fn update_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
    body: axum::body::Bytes,
) -> Result<Json<Room>, SchedulerError> {
    let delta: UpdateRoomRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "sched.handlers.rooms", error = %e, "Invalid request body");
        SchedulerError::InvalidArgument("Invalid request body".to_string())
    })?;

    let current = state
        .store
        .get_room(room_id)
        .await?
        .ok_or_else(|| SchedulerError::NotFound("Room not found".to_string()))?;

    let updated = Room {
        room_id,
        name: delta
            .name
            .map(|name| name.trim().to_string())
            .unwrap_or(current.name),
        capacity: delta.capacity.unwrap_or(current.capacity),
        location: delta.location.or(current.location),
        description: delta.description.or(current.description),
        available: delta.available.unwrap_or(current.available),
    };
    if updated.name.is_empty() {
        return Err(SchedulerError::InvalidArgument(
            "Room name must not be empty".to_string(),
        ));
    }
    if updated.capacity < 1 {
        return Err(SchedulerError::InvalidArgument(
            "Room capacity must be at least 1".to_string(),
        ));
    }

    Ok(Json(state.store.update_room(updated).await?))
}

/// Handler for DELETE /api/rooms/{id}
///
/// Refused while live meetings reference the room; deletion never cascades
/// to meetings.
#[instrument(
    skip_all,
    name = "sched.room.delete",
    fields(method = "DELETE", endpoint = "/api/rooms/{id}")
)]
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, SchedulerError> {
    let live = state.store.live_meetings_for_room(room_id).await?;
    if !live.is_empty() {
        return Err(SchedulerError::Conflict(format!(
            "Room is referenced by {} live meeting(s)",
            live.len()
        )));
    }

    if !state.store.delete_room(room_id).await? {
        return Err(SchedulerError::NotFound("Room not found".to_string()));
    }

    info!(target: "sched.handlers.rooms", room_id = %room_id, "Room deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/rooms/{id}/available-slots
///
/// Best-effort free-slot enumeration over the room's confirmed timeline.
#[instrument(
    skip_all,
    name = "sched.room.available_slots",
    fields(method = "GET", endpoint = "/api/rooms/{id}/available-slots")
)]
pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<AvailableSlot>>, SchedulerError> {
    let slots = state
        .service
        .find_available_slots(
            room_id,
            query.duration_minutes,
            query.search_start,
            query.search_end,
        )
        .await?;
    Ok(Json(slots))
}
