//! Scheduler service API models.
//!
//! Request and response types for the HTTP surface. Requests use
//! `deny_unknown_fields` and carry their own shape validation; entity types
//! live in `sched-core` and cross the boundary unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to schedule a new meeting.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeetingRequest {
    /// Meeting title.
    pub title: String,

    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,

    /// Start instant.
    pub start_time: DateTime<Utc>,

    /// End instant.
    pub end_time: DateTime<Utc>,

    /// Requested room.
    pub room_id: Uuid,

    /// Requested participant set.
    pub participant_ids: Vec<Uuid>,
}

impl MeetingRequest {
    /// Shape checks that precede the static check. Returns one violation
    /// per failed check; violations become an unsatisfiable report, never
    /// a transport-level error.
    pub fn shape_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.title.trim().is_empty() {
            violations.push("Title must not be empty".to_string());
        }
        if self.start_time >= self.end_time {
            violations.push("Invalid time range".to_string());
        }
        if self.participant_ids.is_empty() {
            violations.push("At least one participant is required".to_string());
        }

        violations
    }
}

/// Delta applied to an existing meeting. All fields are optional; only
/// provided fields overlay the persisted values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMeetingRequest {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub room_id: Option<Uuid>,

    #[serde(default)]
    pub participant_ids: Option<Vec<Uuid>>,
}

impl UpdateMeetingRequest {
    /// Check if the request has any changes.
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
            || self.room_id.is_some()
            || self.participant_ids.is_some()
    }
}

/// Request to create a room.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomRequest {
    /// Room name, unique across rooms.
    pub name: String,

    /// Seating capacity.
    pub capacity: i32,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Whether the room accepts bookings (default: true).
    #[serde(default)]
    pub available: Option<bool>,
}

impl RoomRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Room name must not be empty");
        }
        if self.capacity < 1 {
            return Err("Room capacity must be at least 1");
        }
        Ok(())
    }
}

/// Delta applied to an existing room.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRoomRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub capacity: Option<i32>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub available: Option<bool>,
}

/// Request to create a participant.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticipantRequest {
    /// Display name.
    pub name: String,

    /// Email address, unique across participants.
    pub email: String,

    #[serde(default)]
    pub department: Option<String>,
}

impl ParticipantRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Participant name must not be empty");
        }
        if !self.email.contains('@') {
            return Err("Participant email must be a valid address");
        }
        Ok(())
    }
}

/// Delta applied to an existing participant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateParticipantRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub department: Option<String>,
}

/// One proposal in a batch verification request.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeetingProposal {
    pub room_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub participant_ids: Vec<Uuid>,
}

/// Request to verify a batch of proposals without persisting anything.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchVerifyRequest {
    pub proposals: Vec<MeetingProposal>,
}

/// Query parameters for the availability finder.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    /// Requested meeting length in minutes.
    pub duration_minutes: u32,

    /// Search window start (default: now).
    #[serde(default)]
    pub search_start: Option<DateTime<Utc>>,

    /// Search window end (default: start plus the configured window).
    #[serde(default)]
    pub search_end: Option<DateTime<Utc>>,
}

/// Query parameters for the meetings-in-range listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A free slot reported by the availability finder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Health check response.
///
/// Returned by the `/health` and `/ready` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status ("healthy" or "unhealthy").
    pub status: String,

    /// Database connectivity status (optional, for readiness).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, hour, 0, 0).unwrap()
    }

    fn valid_meeting_request() -> MeetingRequest {
        MeetingRequest {
            title: "Planning".to_string(),
            description: None,
            start_time: at(10),
            end_time: at(11),
            room_id: Uuid::new_v4(),
            participant_ids: vec![Uuid::new_v4()],
        }
    }

    #[test]
    fn test_meeting_request_valid_shape() {
        assert!(valid_meeting_request().shape_violations().is_empty());
    }

    #[test]
    fn test_meeting_request_rejects_inverted_interval() {
        let mut request = valid_meeting_request();
        request.start_time = at(11);
        request.end_time = at(10);
        assert_eq!(
            request.shape_violations(),
            vec!["Invalid time range".to_string()]
        );
    }

    #[test]
    fn test_meeting_request_rejects_empty_title_and_participants() {
        let mut request = valid_meeting_request();
        request.title = "   ".to_string();
        request.participant_ids.clear();
        let violations = request.shape_violations();
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_meeting_request_rejects_unknown_fields() {
        let json = r#"{
            "title": "x", "start_time": "2030-01-01T10:00:00Z",
            "end_time": "2030-01-01T11:00:00Z",
            "room_id": "00000000-0000-0000-0000-000000000000",
            "participant_ids": [], "extra": true
        }"#;
        let result: Result<MeetingRequest, _> = serde_json::from_str(json);
        assert!(result.is_err(), "Should reject unknown fields");
    }

    #[test]
    fn test_update_meeting_request_has_changes() {
        let empty = UpdateMeetingRequest::default();
        assert!(!empty.has_changes());

        let delta = UpdateMeetingRequest {
            title: Some("Renamed".to_string()),
            ..UpdateMeetingRequest::default()
        };
        assert!(delta.has_changes());
    }

    #[test]
    fn test_room_request_validation() {
        let request = RoomRequest {
            name: "War Room".to_string(),
            capacity: 8,
            location: None,
            description: None,
            available: None,
        };
        assert!(request.validate().is_ok());

        let bad_capacity = RoomRequest {
            capacity: 0,
            ..request.clone()
        };
        assert_eq!(
            bad_capacity.validate().unwrap_err(),
            "Room capacity must be at least 1"
        );

        let bad_name = RoomRequest {
            name: " ".to_string(),
            ..request
        };
        assert_eq!(
            bad_name.validate().unwrap_err(),
            "Room name must not be empty"
        );
    }

    #[test]
    fn test_participant_request_validation() {
        let request = ParticipantRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            department: None,
        };
        assert!(request.validate().is_ok());

        let bad_email = ParticipantRequest {
            email: "not-an-address".to_string(),
            ..request
        };
        assert_eq!(
            bad_email.validate().unwrap_err(),
            "Participant email must be a valid address"
        );
    }

    #[test]
    fn test_availability_query_deserialization() {
        let query: AvailabilityQuery =
            serde_json::from_str(r#"{"duration_minutes": 45}"#).unwrap();
        assert_eq!(query.duration_minutes, 45);
        assert!(query.search_start.is_none());
        assert!(query.search_end.is_none());
    }
}
