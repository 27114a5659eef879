//! Domain entities for the room scheduler.
//!
//! Entities are identified by id only; equality and hashing ignore the
//! remaining fields. The `Meeting -> Room` and `Meeting -> participants`
//! direction is canonical: meetings carry ids, never owned copies of the
//! referenced entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Meeting status enumeration.
///
/// Lifecycle: meetings are admitted as `Pending` and move through the
/// transition machine below. `Rejected`, `Cancelled` and `Completed` are
/// terminal.
///
/// ```text
/// Pending ---> Confirmed ---> Cancelled
///    |              |
///    |              +-------> Completed
///    +------> Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    /// Admitted but awaiting confirmation or rejection.
    Pending,

    /// Confirmed and counted as a hard obstacle by the static check.
    Confirmed,

    /// Refused after admission. Terminal.
    Rejected,

    /// Confirmed then called off. Terminal.
    Cancelled,

    /// Ran to completion. Terminal.
    Completed,
}

impl MeetingStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Pending => "pending",
            MeetingStatus::Confirmed => "confirmed",
            MeetingStatus::Rejected => "rejected",
            MeetingStatus::Cancelled => "cancelled",
            MeetingStatus::Completed => "completed",
        }
    }

    /// Parse a status from its string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(MeetingStatus::Pending),
            "confirmed" => Some(MeetingStatus::Confirmed),
            "rejected" => Some(MeetingStatus::Rejected),
            "cancelled" => Some(MeetingStatus::Cancelled),
            "completed" => Some(MeetingStatus::Completed),
            _ => None,
        }
    }

    /// Whether the status machine permits moving from `self` to `next`.
    ///
    /// Valid transitions: `Pending -> Confirmed`, `Pending -> Rejected`,
    /// `Confirmed -> Cancelled`, `Confirmed -> Completed`. Everything else
    /// is invalid.
    pub fn can_transition_to(&self, next: MeetingStatus) -> bool {
        matches!(
            (self, next),
            (MeetingStatus::Pending, MeetingStatus::Confirmed)
                | (MeetingStatus::Pending, MeetingStatus::Rejected)
                | (MeetingStatus::Confirmed, MeetingStatus::Cancelled)
                | (MeetingStatus::Confirmed, MeetingStatus::Completed)
        )
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MeetingStatus::Rejected | MeetingStatus::Cancelled | MeetingStatus::Completed
        )
    }

    /// Live meetings occupy their room and their participants' time.
    pub fn is_live(&self) -> bool {
        matches!(self, MeetingStatus::Pending | MeetingStatus::Confirmed)
    }
}

/// A bookable room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub room_id: Uuid,

    /// Human-readable name, unique across rooms.
    pub name: String,

    /// Seating capacity, at least 1.
    pub capacity: i32,

    /// Optional free-form location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the room accepts new bookings.
    pub available: bool,
}

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        self.room_id == other.room_id
    }
}

impl Eq for Room {}

/// A meeting participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Unique participant identifier.
    pub participant_id: Uuid,

    /// Display name.
    pub name: String,

    /// Email address, unique across participants.
    pub email: String,

    /// Optional department.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.participant_id == other.participant_id
    }
}

impl Eq for Participant {}

/// A scheduled meeting.
///
/// Times are absolute instants; every comparison in the verification core
/// happens on UTC epoch seconds over the half-open interval
/// `[start_time, end_time)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    /// Unique meeting identifier.
    pub meeting_id: Uuid,

    /// Meeting title.
    pub title: String,

    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Start instant (inclusive).
    pub start_time: DateTime<Utc>,

    /// End instant (exclusive).
    pub end_time: DateTime<Utc>,

    /// The booked room.
    pub room_id: Uuid,

    /// Non-empty set of participant ids.
    pub participant_ids: Vec<Uuid>,

    /// Current lifecycle status.
    pub status: MeetingStatus,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    /// The meeting interval as UTC epoch seconds `(start, end)`.
    pub fn interval_secs(&self) -> (i64, i64) {
        (self.start_time.timestamp(), self.end_time.timestamp())
    }
}

impl PartialEq for Meeting {
    fn eq(&self, other: &Self) -> bool {
        self.meeting_id == other.meeting_id
    }
}

impl Eq for Meeting {}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_meeting() -> Meeting {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap();
        Meeting {
            meeting_id: Uuid::new_v4(),
            title: "Standup".to_string(),
            description: None,
            start_time: Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2030, 1, 1, 11, 0, 0).unwrap(),
            room_id: Uuid::new_v4(),
            participant_ids: vec![Uuid::new_v4()],
            status: MeetingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            MeetingStatus::Pending,
            MeetingStatus::Confirmed,
            MeetingStatus::Rejected,
            MeetingStatus::Cancelled,
            MeetingStatus::Completed,
        ] {
            assert_eq!(MeetingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MeetingStatus::parse("archived"), None);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&MeetingStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");

        let status: MeetingStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, MeetingStatus::Pending);
    }

    #[test]
    fn test_valid_transitions() {
        assert!(MeetingStatus::Pending.can_transition_to(MeetingStatus::Confirmed));
        assert!(MeetingStatus::Pending.can_transition_to(MeetingStatus::Rejected));
        assert!(MeetingStatus::Confirmed.can_transition_to(MeetingStatus::Cancelled));
        assert!(MeetingStatus::Confirmed.can_transition_to(MeetingStatus::Completed));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!MeetingStatus::Pending.can_transition_to(MeetingStatus::Cancelled));
        assert!(!MeetingStatus::Pending.can_transition_to(MeetingStatus::Completed));
        assert!(!MeetingStatus::Confirmed.can_transition_to(MeetingStatus::Rejected));
        assert!(!MeetingStatus::Confirmed.can_transition_to(MeetingStatus::Pending));
        assert!(!MeetingStatus::Rejected.can_transition_to(MeetingStatus::Confirmed));
        assert!(!MeetingStatus::Cancelled.can_transition_to(MeetingStatus::Pending));
        assert!(!MeetingStatus::Completed.can_transition_to(MeetingStatus::Cancelled));
        // Self-transitions are not part of the machine either.
        assert!(!MeetingStatus::Pending.can_transition_to(MeetingStatus::Pending));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!MeetingStatus::Pending.is_terminal());
        assert!(!MeetingStatus::Confirmed.is_terminal());
        assert!(MeetingStatus::Rejected.is_terminal());
        assert!(MeetingStatus::Cancelled.is_terminal());
        assert!(MeetingStatus::Completed.is_terminal());
    }

    #[test]
    fn test_live_statuses() {
        assert!(MeetingStatus::Pending.is_live());
        assert!(MeetingStatus::Confirmed.is_live());
        assert!(!MeetingStatus::Rejected.is_live());
        assert!(!MeetingStatus::Cancelled.is_live());
        assert!(!MeetingStatus::Completed.is_live());
    }

    #[test]
    fn test_entity_equality_is_by_id() {
        let a = sample_meeting();
        let mut b = a.clone();
        b.title = "Renamed".to_string();
        b.status = MeetingStatus::Confirmed;
        assert_eq!(a, b);

        let mut c = a.clone();
        c.meeting_id = Uuid::new_v4();
        assert_ne!(a, c);
    }

    #[test]
    fn test_interval_secs() {
        let m = sample_meeting();
        let (start, end) = m.interval_secs();
        assert_eq!(end - start, 3600);
        assert_eq!(start, m.start_time.timestamp());
    }
}
