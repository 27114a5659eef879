//! Participant handlers.
//!
//! CRUD under `/api/participants`. Like rooms, participant contents are
//! data only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use sched_core::model::Participant;

use crate::errors::SchedulerError;
use crate::models::{ParticipantRequest, UpdateParticipantRequest};
use crate::routes::AppState;

/// Handler for POST /api/participants
#[instrument(
    skip_all,
    name = "sched.participant.create",
    fields(method = "POST", endpoint = "/api/participants")
)]
pub async fn create_participant(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<Participant>), SchedulerError> {
    let request: ParticipantRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "sched.handlers.participants", error = %e, "Invalid request body");
        SchedulerError::InvalidArgument("Invalid request body".to_string())
    })?;
    request
        .validate()
        .map_err(|e| SchedulerError::InvalidArgument(e.to_string()))?;

    let participant = Participant {
        participant_id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        department: request.department,
    };
    let created = state.store.insert_participant(participant).await?;

    info!(
        target: "sched.handlers.participants",
        participant_id = %created.participant_id,
        "Participant created"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for GET /api/participants/{id}
#[instrument(
    skip_all,
    name = "sched.participant.get",
    fields(method = "GET", endpoint = "/api/participants/{id}")
)]
pub async fn get_participant(
    State(state): State<Arc<AppState>>,
    Path(participant_id): Path<Uuid>,
) -> Result<Json<Participant>, SchedulerError> {
    let participant = state
        .store
        .get_participant(participant_id)
        .await?
        .ok_or_else(|| SchedulerError::NotFound("Participant not found".to_string()))?;
    Ok(Json(participant))
}

/// Handler for GET /api/participants
#[instrument(
    skip_all,
    name = "sched.participant.list",
    fields(method = "GET", endpoint = "/api/participants")
)]
pub async fn list_participants(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Participant>>, SchedulerError> {
    Ok(Json(state.store.list_participants().await?))
}

/// Handler for PUT /api/participants/{id}
#[instrument(
    skip_all,
    name = "sched.participant.update",
    fields(method = "PUT", endpoint = "/api/participants/{id}")
)]
pub async fn update_participant(
    State(state): State<Arc<AppState>>,
    Path(participant_id): Path<Uuid>,
    body: axum::body::Bytes,
) -> Result<Json<Participant>, SchedulerError> {
    let delta: UpdateParticipantRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "sched.handlers.participants", error = %e, "Invalid request body");
        SchedulerError::InvalidArgument("Invalid request body".to_string())
    })?;

    let current = state
        .store
        .get_participant(participant_id)
        .await?
        .ok_or_else(|| SchedulerError::NotFound("Participant not found".to_string()))?;

    let updated = Participant {
        participant_id,
        name: delta
            .name
            .map(|name| name.trim().to_string())
            .unwrap_or(current.name),
        email: delta
            .email
            .map(|email| email.trim().to_string())
            .unwrap_or(current.email),
        department: delta.department.or(current.department),
    };
    if updated.name.is_empty() {
        return Err(SchedulerError::InvalidArgument(
            "Participant name must not be empty".to_string(),
        ));
    }
    if !updated.email.contains('@') {
        return Err(SchedulerError::InvalidArgument(
            "Participant email must be a valid address".to_string(),
        ));
    }

    Ok(Json(state.store.update_participant(updated).await?))
}

/// Handler for DELETE /api/participants/{id}
#[instrument(
    skip_all,
    name = "sched.participant.delete",
    fields(method = "DELETE", endpoint = "/api/participants/{id}")
)]
pub async fn delete_participant(
    State(state): State<Arc<AppState>>,
    Path(participant_id): Path<Uuid>,
) -> Result<StatusCode, SchedulerError> {
    if !state.store.delete_participant(participant_id).await? {
        return Err(SchedulerError::NotFound(
            "Participant not found".to_string(),
        ));
    }

    info!(
        target: "sched.handlers.participants",
        participant_id = %participant_id,
        "Participant deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
