//! In-memory store implementation.
//!
//! Backs the service in tests and demo wiring. Every trait method takes
//! one lock over the whole state, which makes each call atomic — the same
//! guarantee the Postgres implementation gets from per-call transactions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use sched_core::model::{Meeting, MeetingStatus, Participant, Room};

use super::{MeetingStore, StoreError};

/// In-memory store for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    rooms: HashMap<Uuid, Room>,
    participants: HashMap<Uuid, Participant>,
    meetings: HashMap<Uuid, Meeting>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MeetingStore for InMemoryStore {
    async fn insert_room(&self, room: Room) -> Result<Room, StoreError> {
        let mut inner = self.inner.lock();
        if inner
            .rooms
            .values()
            .any(|existing| existing.name == room.name)
        {
            return Err(StoreError::UniqueViolation(format!(
                "Room name '{}' already in use",
                room.name
            )));
        }
        inner.rooms.insert(room.room_id, room.clone());
        Ok(room)
    }

    async fn get_room(&self, room_id: Uuid) -> Result<Option<Room>, StoreError> {
        Ok(self.inner.lock().rooms.get(&room_id).cloned())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let mut rooms: Vec<Room> = self.inner.lock().rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }

    async fn update_room(&self, room: Room) -> Result<Room, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.rooms.contains_key(&room.room_id) {
            return Err(StoreError::NotFound("Room not found".to_string()));
        }
        if inner
            .rooms
            .values()
            .any(|existing| existing.room_id != room.room_id && existing.name == room.name)
        {
            return Err(StoreError::UniqueViolation(format!(
                "Room name '{}' already in use",
                room.name
            )));
        }
        inner.rooms.insert(room.room_id, room.clone());
        Ok(room)
    }

    async fn delete_room(&self, room_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.lock().rooms.remove(&room_id).is_some())
    }

    async fn insert_participant(
        &self,
        participant: Participant,
    ) -> Result<Participant, StoreError> {
        let mut inner = self.inner.lock();
        if inner
            .participants
            .values()
            .any(|existing| existing.email == participant.email)
        {
            return Err(StoreError::UniqueViolation(format!(
                "Participant email '{}' already in use",
                participant.email
            )));
        }
        inner
            .participants
            .insert(participant.participant_id, participant.clone());
        Ok(participant)
    }

    async fn get_participant(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<Participant>, StoreError> {
        Ok(self
            .inner
            .lock()
            .participants
            .get(&participant_id)
            .cloned())
    }

    async fn get_participants(&self, ids: &[Uuid]) -> Result<Vec<Participant>, StoreError> {
        let inner = self.inner.lock();
        Ok(ids
            .iter()
            .filter_map(|id| inner.participants.get(id).cloned())
            .collect())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError> {
        let mut participants: Vec<Participant> =
            self.inner.lock().participants.values().cloned().collect();
        participants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(participants)
    }

    async fn update_participant(
        &self,
        participant: Participant,
    ) -> Result<Participant, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.participants.contains_key(&participant.participant_id) {
            return Err(StoreError::NotFound("Participant not found".to_string()));
        }
        if inner.participants.values().any(|existing| {
            existing.participant_id != participant.participant_id
                && existing.email == participant.email
        }) {
            return Err(StoreError::UniqueViolation(format!(
                "Participant email '{}' already in use",
                participant.email
            )));
        }
        inner
            .participants
            .insert(participant.participant_id, participant.clone());
        Ok(participant)
    }

    async fn delete_participant(&self, participant_id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .lock()
            .participants
            .remove(&participant_id)
            .is_some())
    }

    async fn insert_meeting(&self, meeting: Meeting) -> Result<Meeting, StoreError> {
        self.inner
            .lock()
            .meetings
            .insert(meeting.meeting_id, meeting.clone());
        Ok(meeting)
    }

    async fn get_meeting(&self, meeting_id: Uuid) -> Result<Option<Meeting>, StoreError> {
        Ok(self.inner.lock().meetings.get(&meeting_id).cloned())
    }

    async fn update_meeting(&self, meeting: Meeting) -> Result<Meeting, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.meetings.contains_key(&meeting.meeting_id) {
            return Err(StoreError::NotFound("Meeting not found".to_string()));
        }
        inner.meetings.insert(meeting.meeting_id, meeting.clone());
        Ok(meeting)
    }

    async fn delete_meeting(&self, meeting_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.lock().meetings.remove(&meeting_id).is_some())
    }

    async fn list_meetings(&self) -> Result<Vec<Meeting>, StoreError> {
        Ok(self.sorted_meetings(|_| true))
    }

    async fn meetings_by_status(
        &self,
        status: MeetingStatus,
    ) -> Result<Vec<Meeting>, StoreError> {
        Ok(self.sorted_meetings(|meeting| meeting.status == status))
    }

    async fn meetings_by_room(&self, room_id: Uuid) -> Result<Vec<Meeting>, StoreError> {
        Ok(self.sorted_meetings(|meeting| meeting.room_id == room_id))
    }

    async fn meetings_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Meeting>, StoreError> {
        Ok(self.sorted_meetings(|meeting| meeting.start_time < end && start < meeting.end_time))
    }

    async fn confirmed_meetings(&self) -> Result<Vec<Meeting>, StoreError> {
        Ok(self.sorted_meetings(|meeting| meeting.status == MeetingStatus::Confirmed))
    }

    async fn confirmed_meetings_for_room(
        &self,
        room_id: Uuid,
    ) -> Result<Vec<Meeting>, StoreError> {
        Ok(self.sorted_meetings(|meeting| {
            meeting.status == MeetingStatus::Confirmed && meeting.room_id == room_id
        }))
    }

    async fn live_meetings_for_room(&self, room_id: Uuid) -> Result<Vec<Meeting>, StoreError> {
        Ok(self.sorted_meetings(|meeting| meeting.status.is_live() && meeting.room_id == room_id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl InMemoryStore {
    fn sorted_meetings<F: Fn(&Meeting) -> bool>(&self, keep: F) -> Vec<Meeting> {
        let mut meetings: Vec<Meeting> = self
            .inner
            .lock()
            .meetings
            .values()
            .filter(|meeting| keep(meeting))
            .cloned()
            .collect();
        meetings.sort_by_key(|meeting| meeting.start_time);
        meetings
    }
}
