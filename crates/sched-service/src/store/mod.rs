//! Persistence store seam.
//!
//! The store owns the canonical meeting set; the runtime monitor keeps a
//! derived mirror of it. The trait is the service's only view of
//! persistence, so the scheduling flow runs identically against Postgres
//! ([`PgStore`]) and the in-memory implementation ([`InMemoryStore`]) used
//! by tests and demo wiring. No verification state is persisted.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use sched_core::model::{Meeting, MeetingStatus, Participant, Room};

/// Store operation failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated (room name, participant email).
    #[error("Unique violation: {0}")]
    UniqueViolation(String),

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(String),
}

/// Canonical persistence operations used by the scheduling service.
///
/// Mutating meeting operations are atomic per call: a meeting row and its
/// participant set commit together or not at all.
#[async_trait]
pub trait MeetingStore: Send + Sync {
    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// Insert a room. Fails with [`StoreError::UniqueViolation`] when the
    /// name is taken.
    async fn insert_room(&self, room: Room) -> Result<Room, StoreError>;

    /// Fetch a room by id.
    async fn get_room(&self, room_id: Uuid) -> Result<Option<Room>, StoreError>;

    /// List all rooms, ordered by name.
    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError>;

    /// Replace a room row. Fails with [`StoreError::NotFound`] when absent.
    async fn update_room(&self, room: Room) -> Result<Room, StoreError>;

    /// Delete a room. Returns whether a row was removed.
    async fn delete_room(&self, room_id: Uuid) -> Result<bool, StoreError>;

    // ------------------------------------------------------------------
    // Participants
    // ------------------------------------------------------------------

    /// Insert a participant. Fails with [`StoreError::UniqueViolation`]
    /// when the email is taken.
    async fn insert_participant(&self, participant: Participant)
        -> Result<Participant, StoreError>;

    /// Fetch a participant by id.
    async fn get_participant(&self, participant_id: Uuid)
        -> Result<Option<Participant>, StoreError>;

    /// Fetch the participants among `ids` that exist.
    async fn get_participants(&self, ids: &[Uuid]) -> Result<Vec<Participant>, StoreError>;

    /// List all participants, ordered by name.
    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError>;

    /// Replace a participant row.
    async fn update_participant(&self, participant: Participant)
        -> Result<Participant, StoreError>;

    /// Delete a participant. Returns whether a row was removed.
    async fn delete_participant(&self, participant_id: Uuid) -> Result<bool, StoreError>;

    // ------------------------------------------------------------------
    // Meetings
    // ------------------------------------------------------------------

    /// Insert a meeting and its participant set.
    async fn insert_meeting(&self, meeting: Meeting) -> Result<Meeting, StoreError>;

    /// Fetch a meeting by id.
    async fn get_meeting(&self, meeting_id: Uuid) -> Result<Option<Meeting>, StoreError>;

    /// Replace a meeting row and its participant set.
    async fn update_meeting(&self, meeting: Meeting) -> Result<Meeting, StoreError>;

    /// Delete a meeting. Returns whether a row was removed.
    async fn delete_meeting(&self, meeting_id: Uuid) -> Result<bool, StoreError>;

    /// List all meetings, ordered by start time.
    async fn list_meetings(&self) -> Result<Vec<Meeting>, StoreError>;

    /// List meetings with the given status.
    async fn meetings_by_status(&self, status: MeetingStatus)
        -> Result<Vec<Meeting>, StoreError>;

    /// List meetings booked in the given room.
    async fn meetings_by_room(&self, room_id: Uuid) -> Result<Vec<Meeting>, StoreError>;

    /// List meetings whose interval overlaps `[start, end)`.
    async fn meetings_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Meeting>, StoreError>;

    /// The confirmed snapshot: all meetings with status CONFIRMED.
    async fn confirmed_meetings(&self) -> Result<Vec<Meeting>, StoreError>;

    /// Confirmed meetings in one room, ordered by start time.
    async fn confirmed_meetings_for_room(&self, room_id: Uuid)
        -> Result<Vec<Meeting>, StoreError>;

    /// Live (pending or confirmed) meetings referencing one room.
    async fn live_meetings_for_room(&self, room_id: Uuid) -> Result<Vec<Meeting>, StoreError>;

    /// Connectivity probe for the readiness endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
