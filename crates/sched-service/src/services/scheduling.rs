//! Scheduling service.
//!
//! Sequences the two verification layers around persistence. Within one
//! request the order is strict: validate, static-check, persist, notify
//! the monitor. Nothing is persisted and no event is emitted when the
//! static check refuses; monitor findings raised while admitting a request
//! surface as warnings on the result and never revert persistence.
//!
//! Across requests there is no serialization of the static check with the
//! persistence commit: two concurrent creates over the same interval can
//! both pass the check and both commit, and the monitor then raises a
//! CRITICAL overlap. Detecting that race is the monitor's job; preventing
//! it is not required here.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use sched_core::model::{Meeting, MeetingStatus, Participant, Room};
use sched_core::monitor::{LifecycleMonitor, MeetingObservation, PropertyViolation, Severity};
use sched_core::report::SchedulingResult;
use sched_core::solver::{BookedMeeting, DecisionBackend, DecisionResult, SchedulingConstraint};

use crate::config::Config;
use crate::errors::SchedulerError;
use crate::models::{AvailableSlot, MeetingProposal, MeetingRequest, UpdateMeetingRequest};
use crate::observability::metrics;
use crate::store::MeetingStore;

use super::availability;

/// Orchestrates validation, the static check, persistence and the runtime
/// monitor. Process-wide singleton shared across request handlers.
pub struct SchedulingService {
    store: Arc<dyn MeetingStore>,
    backend: Arc<dyn DecisionBackend>,
    monitor: Arc<LifecycleMonitor>,
    slot_increment_minutes: u32,
    search_window_days: u32,
}

impl SchedulingService {
    /// Wire the service to its collaborators.
    pub fn new(
        store: Arc<dyn MeetingStore>,
        backend: Arc<dyn DecisionBackend>,
        monitor: Arc<LifecycleMonitor>,
        config: &Config,
    ) -> Self {
        SchedulingService {
            store,
            backend,
            monitor,
            slot_increment_minutes: config.slot_increment_minutes,
            search_window_days: config.search_window_days,
        }
    }

    /// The injected runtime monitor.
    pub fn monitor(&self) -> &Arc<LifecycleMonitor> {
        &self.monitor
    }

    /// The injected decision backend.
    pub fn backend(&self) -> &Arc<dyn DecisionBackend> {
        &self.backend
    }

    /// Schedule a new meeting.
    ///
    /// Flow: shape checks, room and participant resolution, static check
    /// against the confirmed snapshot, persistence as PENDING, monitor
    /// notification. An unsatisfiable check returns the witness list with
    /// nothing persisted.
    #[instrument(skip_all, name = "sched.service.create", fields(room_id = %request.room_id))]
    pub async fn create_meeting(
        &self,
        request: MeetingRequest,
    ) -> Result<SchedulingResult, SchedulerError> {
        let shape_violations = request.shape_violations();
        if !shape_violations.is_empty() {
            return Ok(SchedulingResult::failure(
                shape_violations,
                "Request validation failed",
                0,
            ));
        }

        let room = self.load_room(request.room_id).await?;
        if !room.available {
            return Ok(SchedulingResult::failure(
                vec![format!("Room '{}' is not available", room.name)],
                "Room is not available",
                0,
            ));
        }

        let participants = self.resolve_participants(&request.participant_ids).await?;

        let constraint = SchedulingConstraint {
            meeting_id: None,
            room_id: room.room_id,
            room_capacity: room.capacity,
            start: request.start_time,
            end: request.end_time,
            participant_ids: participants
                .iter()
                .map(|participant| participant.participant_id)
                .collect(),
        };

        let decision = self.decide(&constraint).await?;
        if let Some(refusal) =
            SchedulingResult::from_adverse_decision(&decision, "Scheduling constraints violated")
        {
            info!(
                target: "sched.service",
                room_id = %room.room_id,
                violations = refusal.constraint_violations.len(),
                "Meeting refused by static check"
            );
            return Ok(refusal);
        }

        let now = Utc::now();
        let meeting = Meeting {
            meeting_id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description,
            start_time: request.start_time,
            end_time: request.end_time,
            room_id: room.room_id,
            participant_ids: constraint.participant_ids.clone(),
            status: MeetingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let persisted = self.store.insert_meeting(meeting).await?;

        let raised = self
            .monitor
            .on_create(&MeetingObservation::of(&persisted, room.capacity));
        let warnings = self.report_violations(&raised);
        if !warnings.is_empty() {
            warn!(
                target: "sched.service",
                meeting_id = %persisted.meeting_id,
                warnings = warnings.len(),
                "Monitor raised findings while admitting meeting"
            );
        }

        info!(
            target: "sched.service",
            meeting_id = %persisted.meeting_id,
            room_id = %persisted.room_id,
            "Meeting scheduled"
        );

        Ok(
            SchedulingResult::success(
                persisted,
                "Meeting scheduled successfully",
                decision.solving_time_ms(),
            )
            .with_warnings(warnings),
        )
    }

    /// Update a meeting by overlaying a delta onto the persisted fields.
    ///
    /// The meeting itself is excluded from the snapshot during the static
    /// check, so a delta that does not move the interval decides as
    /// satisfiable.
    #[instrument(skip_all, name = "sched.service.update", fields(meeting_id = %meeting_id))]
    pub async fn update_meeting(
        &self,
        meeting_id: Uuid,
        delta: UpdateMeetingRequest,
    ) -> Result<SchedulingResult, SchedulerError> {
        let current = self.load_meeting(meeting_id).await?;
        if matches!(
            current.status,
            MeetingStatus::Completed | MeetingStatus::Cancelled
        ) {
            return Err(SchedulerError::InvalidArgument(format!(
                "Cannot update a {} meeting",
                current.status.as_str()
            )));
        }

        let title = delta.title.unwrap_or_else(|| current.title.clone());
        let description = delta.description.or_else(|| current.description.clone());
        let start_time = delta.start_time.unwrap_or(current.start_time);
        let end_time = delta.end_time.unwrap_or(current.end_time);
        let room_id = delta.room_id.unwrap_or(current.room_id);
        let participant_ids = match delta.participant_ids {
            Some(ids) => {
                self.resolve_participants(&ids)
                    .await?
                    .iter()
                    .map(|participant| participant.participant_id)
                    .collect()
            }
            None => current.participant_ids.clone(),
        };

        let mut shape_violations = Vec::new();
        if title.trim().is_empty() {
            shape_violations.push("Title must not be empty".to_string());
        }
        if start_time >= end_time {
            shape_violations.push("Invalid time range".to_string());
        }
        if participant_ids.is_empty() {
            shape_violations.push("At least one participant is required".to_string());
        }
        if !shape_violations.is_empty() {
            return Ok(SchedulingResult::failure(
                shape_violations,
                "Request validation failed",
                0,
            ));
        }

        let room = self.load_room(room_id).await?;
        if room.room_id != current.room_id && !room.available {
            return Ok(SchedulingResult::failure(
                vec![format!("Room '{}' is not available", room.name)],
                "Room is not available",
                0,
            ));
        }

        let constraint = SchedulingConstraint {
            meeting_id: Some(meeting_id),
            room_id: room.room_id,
            room_capacity: room.capacity,
            start: start_time,
            end: end_time,
            participant_ids,
        };

        let decision = self.decide(&constraint).await?;
        if let Some(refusal) =
            SchedulingResult::from_adverse_decision(&decision, "Scheduling constraints violated")
        {
            return Ok(refusal);
        }

        let updated = Meeting {
            title: title.trim().to_string(),
            description,
            start_time,
            end_time,
            room_id: room.room_id,
            participant_ids: constraint.participant_ids.clone(),
            updated_at: Utc::now(),
            ..current
        };
        let persisted = self.store.update_meeting(updated).await?;

        self.monitor.on_update(meeting_id);

        info!(
            target: "sched.service",
            meeting_id = %meeting_id,
            "Meeting updated"
        );

        Ok(SchedulingResult::success(
            persisted,
            "Meeting updated successfully",
            decision.solving_time_ms(),
        ))
    }

    /// Transition a meeting through the status machine and notify the
    /// matching monitor handler.
    #[instrument(
        skip_all,
        name = "sched.service.transition",
        fields(meeting_id = %meeting_id, new_status = new_status.as_str())
    )]
    pub async fn transition(
        &self,
        meeting_id: Uuid,
        new_status: MeetingStatus,
    ) -> Result<Meeting, SchedulerError> {
        let current = self.load_meeting(meeting_id).await?;
        if !current.status.can_transition_to(new_status) {
            return Err(SchedulerError::InvalidArgument(format!(
                "Invalid status transition: {} -> {}",
                current.status.as_str(),
                new_status.as_str()
            )));
        }

        let prior_status = current.status;
        let updated = Meeting {
            status: new_status,
            updated_at: Utc::now(),
            ..current
        };
        let persisted = self.store.update_meeting(updated).await?;

        let raised = match new_status {
            MeetingStatus::Confirmed => self.monitor.on_confirm(meeting_id),
            MeetingStatus::Rejected => self.monitor.on_reject(meeting_id),
            MeetingStatus::Cancelled => self.monitor.on_cancel(meeting_id, Some(prior_status)),
            MeetingStatus::Completed => self.monitor.on_complete(meeting_id),
            MeetingStatus::Pending => Vec::new(),
        };
        self.report_violations(&raised);

        info!(
            target: "sched.service",
            meeting_id = %meeting_id,
            prior_status = prior_status.as_str(),
            new_status = new_status.as_str(),
            "Meeting transitioned"
        );

        Ok(persisted)
    }

    /// Delete a meeting.
    ///
    /// The monitor's delete handler runs first; an ERROR or CRITICAL
    /// finding from it refuses the delete and nothing is removed from the
    /// store. On success the meeting's stale violation history is pruned.
    #[instrument(skip_all, name = "sched.service.delete", fields(meeting_id = %meeting_id))]
    pub async fn delete_meeting(&self, meeting_id: Uuid) -> Result<(), SchedulerError> {
        let current = self.load_meeting(meeting_id).await?;

        let raised = self.monitor.on_delete(meeting_id, Some(current.status));
        self.report_violations(&raised);
        let blocking: Vec<String> = raised
            .iter()
            .filter(|violation| violation.severity >= Severity::Error)
            .map(|violation| format!("{}: {}", violation.property, violation.details))
            .collect();
        if !blocking.is_empty() {
            warn!(
                target: "sched.service",
                meeting_id = %meeting_id,
                findings = blocking.len(),
                "Monitor refused meeting deletion"
            );
            return Err(SchedulerError::DeleteRefused(blocking));
        }

        self.store.delete_meeting(meeting_id).await?;
        self.monitor.remove_violations_for_meeting(meeting_id);

        info!(
            target: "sched.service",
            meeting_id = %meeting_id,
            "Meeting deleted"
        );

        Ok(())
    }

    /// Fetch one meeting.
    pub async fn get_meeting(&self, meeting_id: Uuid) -> Result<Meeting, SchedulerError> {
        self.load_meeting(meeting_id).await
    }

    /// Check a batch of proposals without persisting anything: each
    /// proposal against the confirmed snapshot, then the proposals among
    /// themselves.
    #[instrument(skip_all, name = "sched.service.verify_batch", fields(proposals = proposals.len()))]
    pub async fn verify_batch(
        &self,
        proposals: Vec<MeetingProposal>,
    ) -> Result<SchedulingResult, SchedulerError> {
        let mut constraints = Vec::with_capacity(proposals.len());
        for proposal in &proposals {
            let room = self.load_room(proposal.room_id).await?;
            constraints.push(SchedulingConstraint {
                meeting_id: None,
                room_id: room.room_id,
                room_capacity: room.capacity,
                start: proposal.start_time,
                end: proposal.end_time,
                participant_ids: proposal.participant_ids.clone(),
            });
        }

        let existing = self.confirmed_snapshot().await?;
        let decision = self.backend.check_batch(&constraints, &existing);
        self.record_decision_metrics(&decision);

        match SchedulingResult::from_adverse_decision(&decision, "Batch constraints violated") {
            Some(refusal) => Ok(refusal),
            None => Ok(SchedulingResult::verified(
                "All proposals are jointly admissible",
                decision.solving_time_ms(),
            )),
        }
    }

    /// Enumerate free slots for a duration in one room's confirmed
    /// timeline. Without an explicit window the search covers the
    /// configured number of days starting now.
    #[instrument(skip_all, name = "sched.service.find_slots", fields(room_id = %room_id))]
    pub async fn find_available_slots(
        &self,
        room_id: Uuid,
        duration_minutes: u32,
        search_start: Option<chrono::DateTime<Utc>>,
        search_end: Option<chrono::DateTime<Utc>>,
    ) -> Result<Vec<AvailableSlot>, SchedulerError> {
        if duration_minutes == 0 {
            return Err(SchedulerError::InvalidArgument(
                "Duration must be at least one minute".to_string(),
            ));
        }
        let room = self.load_room(room_id).await?;

        let start = search_start.unwrap_or_else(Utc::now);
        let end = search_end
            .unwrap_or_else(|| start + chrono::Duration::days(i64::from(self.search_window_days)));
        if start >= end {
            return Err(SchedulerError::InvalidArgument(
                "Search window start must precede its end".to_string(),
            ));
        }

        let confirmed = self.store.confirmed_meetings_for_room(room.room_id).await?;
        let busy = availability::busy_slots(
            confirmed
                .iter()
                .map(|meeting| (meeting.start_time, meeting.end_time)),
        );

        let slots = availability::free_slots(
            &busy,
            i64::from(duration_minutes) * 60,
            i64::from(self.slot_increment_minutes) * 60,
            start.timestamp(),
            end.timestamp(),
        );

        Ok(slots
            .into_iter()
            .filter_map(|(slot_start, slot_end)| {
                let start_time = chrono::DateTime::from_timestamp(slot_start, 0)?;
                let end_time = chrono::DateTime::from_timestamp(slot_end, 0)?;
                Some(AvailableSlot {
                    start_time,
                    end_time,
                })
            })
            .collect())
    }

    async fn load_room(&self, room_id: Uuid) -> Result<Room, SchedulerError> {
        self.store
            .get_room(room_id)
            .await?
            .ok_or_else(|| SchedulerError::NotFound("Room not found".to_string()))
    }

    async fn load_meeting(&self, meeting_id: Uuid) -> Result<Meeting, SchedulerError> {
        self.store
            .get_meeting(meeting_id)
            .await?
            .ok_or_else(|| SchedulerError::NotFound("Meeting not found".to_string()))
    }

    /// Resolve participant ids; any missing id is an error.
    async fn resolve_participants(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Participant>, SchedulerError> {
        let found = self.store.get_participants(ids).await?;
        if found.len() != ids.len() {
            let missing = ids
                .iter()
                .find(|id| {
                    !found
                        .iter()
                        .any(|participant| participant.participant_id == **id)
                })
                .map(|id| id.to_string())
                .unwrap_or_default();
            return Err(SchedulerError::NotFound(format!(
                "Participant {} not found",
                missing
            )));
        }
        Ok(found)
    }

    async fn confirmed_snapshot(&self) -> Result<Vec<BookedMeeting>, SchedulerError> {
        let confirmed = self.store.confirmed_meetings().await?;
        Ok(confirmed.iter().map(BookedMeeting::from).collect())
    }

    async fn decide(
        &self,
        constraint: &SchedulingConstraint,
    ) -> Result<DecisionResult, SchedulerError> {
        let existing = self.confirmed_snapshot().await?;
        let decision = self.backend.check_feasibility(constraint, &existing);
        self.record_decision_metrics(&decision);
        Ok(decision)
    }

    fn record_decision_metrics(&self, decision: &DecisionResult) {
        let outcome = match decision {
            DecisionResult::Satisfiable { .. } => "satisfiable",
            DecisionResult::Unsatisfiable { .. } => "unsatisfiable",
            DecisionResult::Error { .. } => "error",
        };
        let elapsed = u64::try_from(decision.solving_time_ms()).unwrap_or(0);
        metrics::record_decision(outcome, Duration::from_millis(elapsed));
    }

    /// Record raised violations in the metrics and format them for the
    /// result's warning list.
    fn report_violations(&self, raised: &[PropertyViolation]) -> Vec<String> {
        raised
            .iter()
            .map(|violation| {
                metrics::record_violation(&violation.property, violation.severity.as_str());
                format!("{}: {}", violation.property, violation.details)
            })
            .collect()
    }
}
