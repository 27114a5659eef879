//! Monitor-local event and violation records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::MeetingStatus;

/// Symbolic names of the monitored properties.
pub mod properties {
    /// Two live meetings overlap in the same room.
    pub const MEETING_OVERLAP: &str = "MEETING_OVERLAP";

    /// Participant count exceeds the room capacity.
    pub const CAPACITY_EXCEEDED: &str = "CAPACITY_EXCEEDED";

    /// A created meeting whose start has passed was never confirmed or
    /// rejected.
    pub const UNRESOLVED_MEETING: &str = "UNRESOLVED_MEETING";

    /// A deletion referred to a meeting that was never created.
    pub const DELETE_NONEXISTENT: &str = "DELETE_NONEXISTENT";

    /// A confirmation arrived for a meeting the monitor never saw created.
    pub const CONFIRM_WITHOUT_CREATE: &str = "CONFIRM_WITHOUT_CREATE";
}

/// Violation severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Surfaced for operator attention; never blocks anything.
    Warning,

    /// A monitored property is violated.
    Error,

    /// A violation that indicates state skew between the decision layer
    /// and observed reality.
    Critical,
}

impl Severity {
    /// Returns the string representation of the severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Parse a severity from its string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "WARNING" => Some(Severity::Warning),
            "ERROR" => Some(Severity::Error),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// Kind of observed lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Create,
    Confirm,
    Reject,
    Delete,
    Cancel,
    Complete,
    Update,
}

/// One observed lifecycle transition, as recorded in the event history.
///
/// Only the fields relevant to the event kind are populated: CREATE carries
/// the room, interval and participant count; DELETE and CANCEL carry the
/// prior status; CONFIRM and REJECT carry the previous and new status.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingEvent {
    /// Transition kind.
    pub kind: EventKind,

    /// Affected meeting.
    pub meeting_id: Uuid,

    /// Room booked by a CREATE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Uuid>,

    /// Interval start of a CREATE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// Interval end of a CREATE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Participant count of a CREATE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_count: Option<usize>,

    /// Status before the transition, where the kind records one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_status: Option<MeetingStatus>,

    /// Status after the transition, where the kind records one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<MeetingStatus>,

    /// When the monitor observed the transition.
    pub observed_at: DateTime<Utc>,
}

impl MeetingEvent {
    fn bare(kind: EventKind, meeting_id: Uuid) -> Self {
        MeetingEvent {
            kind,
            meeting_id,
            room_id: None,
            start_time: None,
            end_time: None,
            participant_count: None,
            prior_status: None,
            new_status: None,
            observed_at: Utc::now(),
        }
    }

    /// A CREATE observation.
    pub fn created(
        meeting_id: Uuid,
        room_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        participant_count: usize,
    ) -> Self {
        MeetingEvent {
            room_id: Some(room_id),
            start_time: Some(start_time),
            end_time: Some(end_time),
            participant_count: Some(participant_count),
            ..Self::bare(EventKind::Create, meeting_id)
        }
    }

    /// A CONFIRM observation.
    pub fn confirmed(meeting_id: Uuid) -> Self {
        MeetingEvent {
            prior_status: Some(MeetingStatus::Pending),
            new_status: Some(MeetingStatus::Confirmed),
            ..Self::bare(EventKind::Confirm, meeting_id)
        }
    }

    /// A REJECT observation.
    pub fn rejected(meeting_id: Uuid) -> Self {
        MeetingEvent {
            prior_status: Some(MeetingStatus::Pending),
            new_status: Some(MeetingStatus::Rejected),
            ..Self::bare(EventKind::Reject, meeting_id)
        }
    }

    /// A DELETE observation with the status the meeting last held.
    pub fn deleted(meeting_id: Uuid, prior_status: Option<MeetingStatus>) -> Self {
        MeetingEvent {
            prior_status,
            ..Self::bare(EventKind::Delete, meeting_id)
        }
    }

    /// A CANCEL observation with the status the meeting last held.
    pub fn cancelled(meeting_id: Uuid, prior_status: Option<MeetingStatus>) -> Self {
        MeetingEvent {
            prior_status,
            new_status: Some(MeetingStatus::Cancelled),
            ..Self::bare(EventKind::Cancel, meeting_id)
        }
    }

    /// A COMPLETE observation.
    pub fn completed(meeting_id: Uuid) -> Self {
        MeetingEvent {
            prior_status: Some(MeetingStatus::Confirmed),
            new_status: Some(MeetingStatus::Completed),
            ..Self::bare(EventKind::Complete, meeting_id)
        }
    }

    /// An UPDATE observation. Recorded for the history only; updates do
    /// not change the pending bookkeeping.
    pub fn updated(meeting_id: Uuid) -> Self {
        Self::bare(EventKind::Update, meeting_id)
    }
}

/// A detected violation of a monitored property.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyViolation {
    /// Symbolic property name (see [`properties`]).
    pub property: String,

    /// Short description of the violated property.
    pub description: String,

    /// Severity of the violation.
    pub severity: Severity,

    /// Offending meeting, when one can be named.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<Uuid>,

    /// When the violation was detected.
    pub detected_at: DateTime<Utc>,

    /// Free-form details naming the offending state.
    pub details: String,
}

impl PropertyViolation {
    /// Build a violation detected now.
    pub fn new(
        property: &str,
        description: &str,
        severity: Severity,
        meeting_id: Option<Uuid>,
        details: String,
    ) -> Self {
        PropertyViolation {
            property: property.to_string(),
            description: description.to_string(),
            severity,
            meeting_id,
            detected_at: Utc::now(),
            details,
        }
    }

    /// Two violations are duplicates when property, meeting, description
    /// and details all match; the detection timestamp is ignored.
    pub fn is_duplicate_of(&self, other: &PropertyViolation) -> bool {
        self.property == other.property
            && self.meeting_id == other.meeting_id
            && self.description == other.description
            && self.details == other.details
    }
}

/// Aggregate counters over the monitor state.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatistics {
    /// Total observed events.
    pub total_events: usize,

    /// Total violations in the log.
    pub total_violations: usize,

    /// Violations with severity WARNING.
    pub warning_count: usize,

    /// Violations with severity ERROR.
    pub error_count: usize,

    /// Violations with severity CRITICAL.
    pub critical_count: usize,

    /// Meetings created but not yet confirmed or rejected.
    pub pending_meetings: usize,

    /// Meetings currently tracked as created.
    pub tracked_meetings: usize,
}
