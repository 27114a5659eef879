//! Runtime lifecycle monitor.
//!
//! An event-sourced, in-memory observer of every successful state
//! transition. It keeps a derived mirror of lifecycle-relevant state and
//! incrementally validates four temporal properties as events arrive:
//!
//! 1. Every created meeting is eventually confirmed or rejected
//! 2. Deletions refer to previously created meetings
//! 3. No two live meetings in the same room overlap in time
//! 4. Participant count does not exceed room capacity
//!
//! The monitor never blocks and never vetoes a transition by itself; its
//! findings are appended to a deduplicated violation log that the hosting
//! service reads and, for deletions only, acts on. The mirror is volatile
//! and rebuilds from zero on restart via [`LifecycleMonitor::reset`].
//!
//! # Concurrency
//!
//! Handlers run on whatever task observed the transition. State is held in
//! concurrent maps keyed by meeting or room id; each per-room timeline
//! serializes its own mutations behind its own lock, so unrelated rooms
//! never contend. Handlers are O(k) in the number of slots of the affected
//! room.

mod events;

pub use events::{
    properties, EventKind, MeetingEvent, MonitorStatistics, PropertyViolation, Severity,
};

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::{Meeting, MeetingStatus};
use crate::solver::overlaps;

/// The CREATE-time facts the monitor tracks for a meeting.
#[derive(Debug, Clone)]
pub struct MeetingObservation {
    /// Meeting id.
    pub meeting_id: Uuid,

    /// Booked room.
    pub room_id: Uuid,

    /// Capacity of the booked room.
    pub room_capacity: i32,

    /// Start instant.
    pub start_time: DateTime<Utc>,

    /// End instant.
    pub end_time: DateTime<Utc>,

    /// Number of participants.
    pub participant_count: usize,
}

impl MeetingObservation {
    /// Observation of a persisted meeting in a room of known capacity.
    pub fn of(meeting: &Meeting, room_capacity: i32) -> Self {
        MeetingObservation {
            meeting_id: meeting.meeting_id,
            room_id: meeting.room_id,
            room_capacity,
            start_time: meeting.start_time,
            end_time: meeting.end_time,
            participant_count: meeting.participant_ids.len(),
        }
    }
}

/// One slot in a per-room timeline.
#[derive(Debug, Clone, Copy)]
struct TimelineSlot {
    meeting_id: Uuid,
    start: i64,
    end: i64,
}

/// The runtime monitor. One instance per process, injected into the
/// scheduling service; all mutation is confined to this boundary.
#[derive(Default)]
pub struct LifecycleMonitor {
    /// Room capacity table, refreshed on every CREATE.
    room_capacities: DashMap<Uuid, i32>,

    /// Ids CREATE-d and not yet DELETE-d.
    created_ids: DashSet<Uuid>,

    /// CREATE facts for meetings not yet confirmed or rejected.
    pending: DashMap<Uuid, MeetingObservation>,

    /// Per-room ordered slots of meetings currently counted as live.
    timelines: DashMap<Uuid, Mutex<Vec<TimelineSlot>>>,

    /// Append-only event history.
    event_history: Mutex<Vec<MeetingEvent>>,

    /// Append-only, deduplicated violation log.
    violations: Mutex<Vec<PropertyViolation>>,
}

impl LifecycleMonitor {
    /// Create an empty monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a CREATE. Returns the violations this event raised.
    pub fn on_create(&self, observation: &MeetingObservation) -> Vec<PropertyViolation> {
        self.push_event(MeetingEvent::created(
            observation.meeting_id,
            observation.room_id,
            observation.start_time,
            observation.end_time,
            observation.participant_count,
        ));

        self.room_capacities
            .insert(observation.room_id, observation.room_capacity);
        self.created_ids.insert(observation.meeting_id);
        self.pending
            .insert(observation.meeting_id, observation.clone());

        let mut raised = Vec::new();

        let capacity = self
            .room_capacities
            .get(&observation.room_id)
            .map(|entry| *entry.value())
            .unwrap_or(observation.room_capacity);
        if observation.participant_count as i64 > i64::from(capacity) {
            raised.push(PropertyViolation::new(
                properties::CAPACITY_EXCEEDED,
                "Participant count exceeds room capacity",
                Severity::Error,
                Some(observation.meeting_id),
                format!(
                    "{} participants assigned to room {} with capacity {}",
                    observation.participant_count, observation.room_id, capacity
                ),
            ));
        }

        let start = observation.start_time.timestamp();
        let end = observation.end_time.timestamp();
        {
            let timeline = self
                .timelines
                .entry(observation.room_id)
                .or_insert_with(|| Mutex::new(Vec::new()));
            let mut slots = timeline.lock();

            let mut overlapping = false;
            for slot in slots.iter() {
                if slot.meeting_id != observation.meeting_id
                    && overlaps(start, end, slot.start, slot.end)
                {
                    overlapping = true;
                    raised.push(PropertyViolation::new(
                        properties::MEETING_OVERLAP,
                        "Two live meetings overlap in the same room",
                        Severity::Critical,
                        Some(observation.meeting_id),
                        format!(
                            "meeting {} overlaps meeting {} in room {}",
                            observation.meeting_id, slot.meeting_id, observation.room_id
                        ),
                    ));
                }
            }

            // Only a clean booking enters the timeline; an overlapping one
            // would poison every later check against this room.
            if !overlapping {
                let position = slots.partition_point(|slot| slot.start <= start);
                slots.insert(
                    position,
                    TimelineSlot {
                        meeting_id: observation.meeting_id,
                        start,
                        end,
                    },
                );
            }
        }

        self.record(raised)
    }

    /// Observe a CONFIRM. Returns the violations this event raised.
    pub fn on_confirm(&self, meeting_id: Uuid) -> Vec<PropertyViolation> {
        self.push_event(MeetingEvent::confirmed(meeting_id));

        let mut raised = Vec::new();
        if self.pending.remove(&meeting_id).is_none() {
            raised.push(PropertyViolation::new(
                properties::CONFIRM_WITHOUT_CREATE,
                "Confirmation for a meeting the monitor never saw created",
                Severity::Warning,
                Some(meeting_id),
                format!("meeting {} confirmed without a CREATE event", meeting_id),
            ));
        }

        self.scrub_unresolved(meeting_id);
        self.record(raised)
    }

    /// Observe a REJECT. A rejected booking releases its slot.
    pub fn on_reject(&self, meeting_id: Uuid) -> Vec<PropertyViolation> {
        self.push_event(MeetingEvent::rejected(meeting_id));
        self.pending.remove(&meeting_id);
        self.scrub_unresolved(meeting_id);
        self.remove_from_timelines(meeting_id);
        Vec::new()
    }

    /// Observe a DELETE. Returns the violations this event raised.
    pub fn on_delete(
        &self,
        meeting_id: Uuid,
        prior_status: Option<MeetingStatus>,
    ) -> Vec<PropertyViolation> {
        self.push_event(MeetingEvent::deleted(meeting_id, prior_status));

        let mut raised = Vec::new();
        if !self.created_ids.contains(&meeting_id) {
            raised.push(PropertyViolation::new(
                properties::DELETE_NONEXISTENT,
                "Deletion refers to a meeting that was never created",
                Severity::Error,
                Some(meeting_id),
                format!("meeting {} deleted without a CREATE event", meeting_id),
            ));
        }

        self.created_ids.remove(&meeting_id);
        self.pending.remove(&meeting_id);
        self.remove_from_timelines(meeting_id);
        self.record(raised)
    }

    /// Observe a CANCEL.
    pub fn on_cancel(
        &self,
        meeting_id: Uuid,
        prior_status: Option<MeetingStatus>,
    ) -> Vec<PropertyViolation> {
        self.push_event(MeetingEvent::cancelled(meeting_id, prior_status));
        self.pending.remove(&meeting_id);
        self.remove_from_timelines(meeting_id);
        Vec::new()
    }

    /// Observe a COMPLETE. A completed meeting no longer occupies its room.
    pub fn on_complete(&self, meeting_id: Uuid) -> Vec<PropertyViolation> {
        self.push_event(MeetingEvent::completed(meeting_id));
        self.remove_from_timelines(meeting_id);
        Vec::new()
    }

    /// Observe an UPDATE. History only; pending bookkeeping is unchanged.
    pub fn on_update(&self, meeting_id: Uuid) {
        self.push_event(MeetingEvent::updated(meeting_id));
    }

    /// Checkpoint sweep: every pending meeting whose start lies before
    /// `now` violates the resolution property. Returns the new violations.
    pub fn check_pending(&self, now: DateTime<Utc>) -> Vec<PropertyViolation> {
        let mut raised = Vec::new();
        for entry in self.pending.iter() {
            let observation = entry.value();
            if observation.start_time < now {
                raised.push(PropertyViolation::new(
                    properties::UNRESOLVED_MEETING,
                    "Meeting was never confirmed or rejected",
                    Severity::Error,
                    Some(observation.meeting_id),
                    format!(
                        "every created meeting must eventually be confirmed or rejected; \
                         meeting {} started at {} and is still unresolved",
                        observation.meeting_id,
                        observation.start_time.to_rfc3339(),
                    ),
                ));
            }
        }

        if !raised.is_empty() {
            warn!(
                target: "sched.monitor",
                unresolved = raised.len(),
                "Pending sweep found unresolved meetings"
            );
        }

        self.record(raised)
    }

    /// Snapshot of the violation log.
    pub fn violations(&self) -> Vec<PropertyViolation> {
        self.violations.lock().clone()
    }

    /// Violations of a given severity.
    pub fn violations_by_severity(&self, severity: Severity) -> Vec<PropertyViolation> {
        self.violations
            .lock()
            .iter()
            .filter(|violation| violation.severity == severity)
            .cloned()
            .collect()
    }

    /// Snapshot of the event history.
    pub fn event_history(&self) -> Vec<MeetingEvent> {
        self.event_history.lock().clone()
    }

    /// Number of meetings awaiting confirmation or rejection.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop every logged violation naming the given meeting. Used by the
    /// service after a successful delete to prune stale history.
    pub fn remove_violations_for_meeting(&self, meeting_id: Uuid) {
        self.violations
            .lock()
            .retain(|violation| violation.meeting_id != Some(meeting_id));
    }

    /// Clear all monitor state.
    pub fn reset(&self) {
        self.room_capacities.clear();
        self.created_ids.clear();
        self.pending.clear();
        self.timelines.clear();
        self.event_history.lock().clear();
        self.violations.lock().clear();
    }

    /// Aggregate counters over the current state.
    pub fn statistics(&self) -> MonitorStatistics {
        let violations = self.violations.lock();
        let count = |severity: Severity| {
            violations
                .iter()
                .filter(|violation| violation.severity == severity)
                .count()
        };
        MonitorStatistics {
            total_events: self.event_history.lock().len(),
            total_violations: violations.len(),
            warning_count: count(Severity::Warning),
            error_count: count(Severity::Error),
            critical_count: count(Severity::Critical),
            pending_meetings: self.pending.len(),
            tracked_meetings: self.created_ids.len(),
        }
    }

    fn push_event(&self, event: MeetingEvent) {
        debug!(
            target: "sched.monitor",
            kind = ?event.kind,
            meeting_id = %event.meeting_id,
            "Observed lifecycle event"
        );
        self.event_history.lock().push(event);
    }

    /// Append `candidates` to the log, suppressing duplicates, and return
    /// the entries that were actually new.
    fn record(&self, candidates: Vec<PropertyViolation>) -> Vec<PropertyViolation> {
        if candidates.is_empty() {
            return candidates;
        }

        let mut log = self.violations.lock();
        let mut fresh: Vec<PropertyViolation> = Vec::new();
        for candidate in candidates {
            let duplicate = log
                .iter()
                .chain(fresh.iter())
                .any(|existing| existing.is_duplicate_of(&candidate));
            if !duplicate {
                fresh.push(candidate);
            }
        }
        log.extend(fresh.iter().cloned());
        fresh
    }

    /// A confirmation or rejection resolves the meeting; any unresolved
    /// finding recorded for it is stale and removed.
    fn scrub_unresolved(&self, meeting_id: Uuid) {
        self.violations.lock().retain(|violation| {
            !(violation.property == properties::UNRESOLVED_MEETING
                && violation.meeting_id == Some(meeting_id))
        });
    }

    fn remove_from_timelines(&self, meeting_id: Uuid) {
        for timeline in self.timelines.iter() {
            timeline
                .value()
                .lock()
                .retain(|slot| slot.meeting_id != meeting_id);
        }
    }
}
