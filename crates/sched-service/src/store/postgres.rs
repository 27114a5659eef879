//! Postgres store implementation.
//!
//! All queries use parameterized statements. Meeting writes run in a
//! transaction so the meeting row and its `meeting_participants` rows
//! commit together. Time columns are `timestamptz` read as UTC instants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use sched_core::model::{Meeting, MeetingStatus, Participant, Room};

use super::{MeetingStore, StoreError};

/// SQL selecting meeting rows with their aggregated participant set.
const MEETING_SELECT: &str = r#"
    SELECT
        m.meeting_id,
        m.title,
        m.description,
        m.start_time,
        m.end_time,
        m.room_id,
        m.status,
        m.created_at,
        m.updated_at,
        COALESCE(
            ARRAY_AGG(mp.participant_id) FILTER (WHERE mp.participant_id IS NOT NULL),
            '{}'
        ) AS participant_ids
    FROM meetings m
    LEFT JOIN meeting_participants mp ON mp.meeting_id = m.meeting_id
"#;

const ROOM_SELECT: &str = r#"
    SELECT room_id, name, capacity, location, description, available
    FROM rooms
"#;

const PARTICIPANT_SELECT: &str = r#"
    SELECT participant_id, name, email, department
    FROM participants
"#;

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn fetch_meetings(&self, suffix: &str) -> Result<Vec<Meeting>, StoreError> {
        let query = format!(
            "{} {} GROUP BY m.meeting_id ORDER BY m.start_time",
            MEETING_SELECT, suffix
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.iter().map(map_row_to_meeting).collect()
    }
}

#[async_trait]
impl MeetingStore for PgStore {
    #[instrument(skip_all, name = "sched.store.insert_room")]
    async fn insert_room(&self, room: Room) -> Result<Room, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO rooms (room_id, name, capacity, location, description, available)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(room.room_id)
        .bind(&room.name)
        .bind(room.capacity)
        .bind(&room.location)
        .bind(&room.description)
        .bind(room.available)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db(e, format!("Room name '{}' already in use", room.name)))?;

        Ok(room)
    }

    async fn get_room(&self, room_id: Uuid) -> Result<Option<Room>, StoreError> {
        let query = format!("{} WHERE room_id = $1", ROOM_SELECT);
        let row = sqlx::query(&query)
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(|r| map_row_to_room(&r)))
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let query = format!("{} ORDER BY name", ROOM_SELECT);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.iter().map(map_row_to_room).collect())
    }

    #[instrument(skip_all, name = "sched.store.update_room")]
    async fn update_room(&self, room: Room) -> Result<Room, StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE rooms
            SET name = $2, capacity = $3, location = $4, description = $5, available = $6
            WHERE room_id = $1
            "#,
        )
        .bind(room.room_id)
        .bind(&room.name)
        .bind(room.capacity)
        .bind(&room.location)
        .bind(&room.description)
        .bind(room.available)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db(e, format!("Room name '{}' already in use", room.name)))?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound("Room not found".to_string()));
        }
        Ok(room)
    }

    async fn delete_room(&self, room_id: Uuid) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM rooms WHERE room_id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(deleted.rows_affected() > 0)
    }

    #[instrument(skip_all, name = "sched.store.insert_participant")]
    async fn insert_participant(
        &self,
        participant: Participant,
    ) -> Result<Participant, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO participants (participant_id, name, email, department)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(participant.participant_id)
        .bind(&participant.name)
        .bind(&participant.email)
        .bind(&participant.department)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            unique_or_db(
                e,
                format!("Participant email '{}' already in use", participant.email),
            )
        })?;

        Ok(participant)
    }

    async fn get_participant(
        &self,
        participant_id: Uuid,
    ) -> Result<Option<Participant>, StoreError> {
        let query = format!("{} WHERE participant_id = $1", PARTICIPANT_SELECT);
        let row = sqlx::query(&query)
            .bind(participant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(|r| map_row_to_participant(&r)))
    }

    async fn get_participants(&self, ids: &[Uuid]) -> Result<Vec<Participant>, StoreError> {
        let query = format!("{} WHERE participant_id = ANY($1)", PARTICIPANT_SELECT);
        let rows = sqlx::query(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.iter().map(map_row_to_participant).collect())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError> {
        let query = format!("{} ORDER BY name", PARTICIPANT_SELECT);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.iter().map(map_row_to_participant).collect())
    }

    #[instrument(skip_all, name = "sched.store.update_participant")]
    async fn update_participant(
        &self,
        participant: Participant,
    ) -> Result<Participant, StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE participants
            SET name = $2, email = $3, department = $4
            WHERE participant_id = $1
            "#,
        )
        .bind(participant.participant_id)
        .bind(&participant.name)
        .bind(&participant.email)
        .bind(&participant.department)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            unique_or_db(
                e,
                format!("Participant email '{}' already in use", participant.email),
            )
        })?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound("Participant not found".to_string()));
        }
        Ok(participant)
    }

    async fn delete_participant(&self, participant_id: Uuid) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM participants WHERE participant_id = $1")
            .bind(participant_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(deleted.rows_affected() > 0)
    }

    #[instrument(skip_all, name = "sched.store.insert_meeting")]
    async fn insert_meeting(&self, meeting: Meeting) -> Result<Meeting, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO meetings (
                meeting_id, title, description, start_time, end_time,
                room_id, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(meeting.meeting_id)
        .bind(&meeting.title)
        .bind(&meeting.description)
        .bind(meeting.start_time)
        .bind(meeting.end_time)
        .bind(meeting.room_id)
        .bind(meeting.status.as_str())
        .bind(meeting.created_at)
        .bind(meeting.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        for participant_id in &meeting.participant_ids {
            sqlx::query(
                "INSERT INTO meeting_participants (meeting_id, participant_id) VALUES ($1, $2)",
            )
            .bind(meeting.meeting_id)
            .bind(participant_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(meeting)
    }

    async fn get_meeting(&self, meeting_id: Uuid) -> Result<Option<Meeting>, StoreError> {
        let query = format!(
            "{} WHERE m.meeting_id = $1 GROUP BY m.meeting_id",
            MEETING_SELECT
        );
        let row = sqlx::query(&query)
            .bind(meeting_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(map_row_to_meeting).transpose()
    }

    #[instrument(skip_all, name = "sched.store.update_meeting")]
    async fn update_meeting(&self, meeting: Meeting) -> Result<Meeting, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query(
            r#"
            UPDATE meetings
            SET title = $2, description = $3, start_time = $4, end_time = $5,
                room_id = $6, status = $7, updated_at = $8
            WHERE meeting_id = $1
            "#,
        )
        .bind(meeting.meeting_id)
        .bind(&meeting.title)
        .bind(&meeting.description)
        .bind(meeting.start_time)
        .bind(meeting.end_time)
        .bind(meeting.room_id)
        .bind(meeting.status.as_str())
        .bind(meeting.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound("Meeting not found".to_string()));
        }

        sqlx::query("DELETE FROM meeting_participants WHERE meeting_id = $1")
            .bind(meeting.meeting_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for participant_id in &meeting.participant_ids {
            sqlx::query(
                "INSERT INTO meeting_participants (meeting_id, participant_id) VALUES ($1, $2)",
            )
            .bind(meeting.meeting_id)
            .bind(participant_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(meeting)
    }

    async fn delete_meeting(&self, meeting_id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM meeting_participants WHERE meeting_id = $1")
            .bind(meeting_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        let deleted = sqlx::query("DELETE FROM meetings WHERE meeting_id = $1")
            .bind(meeting_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(deleted.rows_affected() > 0)
    }

    async fn list_meetings(&self) -> Result<Vec<Meeting>, StoreError> {
        self.fetch_meetings("").await
    }

    async fn meetings_by_status(
        &self,
        status: MeetingStatus,
    ) -> Result<Vec<Meeting>, StoreError> {
        let query = format!(
            "{} WHERE m.status = $1 GROUP BY m.meeting_id ORDER BY m.start_time",
            MEETING_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.iter().map(map_row_to_meeting).collect()
    }

    async fn meetings_by_room(&self, room_id: Uuid) -> Result<Vec<Meeting>, StoreError> {
        let query = format!(
            "{} WHERE m.room_id = $1 GROUP BY m.meeting_id ORDER BY m.start_time",
            MEETING_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(room_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.iter().map(map_row_to_meeting).collect()
    }

    async fn meetings_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Meeting>, StoreError> {
        let query = format!(
            "{} WHERE m.start_time < $2 AND m.end_time > $1 \
             GROUP BY m.meeting_id ORDER BY m.start_time",
            MEETING_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.iter().map(map_row_to_meeting).collect()
    }

    async fn confirmed_meetings(&self) -> Result<Vec<Meeting>, StoreError> {
        self.fetch_meetings("WHERE m.status = 'confirmed'").await
    }

    async fn confirmed_meetings_for_room(
        &self,
        room_id: Uuid,
    ) -> Result<Vec<Meeting>, StoreError> {
        let query = format!(
            "{} WHERE m.status = 'confirmed' AND m.room_id = $1 \
             GROUP BY m.meeting_id ORDER BY m.start_time",
            MEETING_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(room_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.iter().map(map_row_to_meeting).collect()
    }

    async fn live_meetings_for_room(&self, room_id: Uuid) -> Result<Vec<Meeting>, StoreError> {
        let query = format!(
            "{} WHERE m.status IN ('pending', 'confirmed') AND m.room_id = $1 \
             GROUP BY m.meeting_id ORDER BY m.start_time",
            MEETING_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(room_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.iter().map(map_row_to_meeting).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

/// Map a database row to a Room.
fn map_row_to_room(row: &PgRow) -> Room {
    Room {
        room_id: row.get("room_id"),
        name: row.get("name"),
        capacity: row.get("capacity"),
        location: row.get("location"),
        description: row.get("description"),
        available: row.get("available"),
    }
}

/// Map a database row to a Participant.
fn map_row_to_participant(row: &PgRow) -> Participant {
    Participant {
        participant_id: row.get("participant_id"),
        name: row.get("name"),
        email: row.get("email"),
        department: row.get("department"),
    }
}

/// Map a database row to a Meeting.
///
/// Shared by all queries that return meeting rows to avoid field-by-field
/// mapping duplication.
fn map_row_to_meeting(row: &PgRow) -> Result<Meeting, StoreError> {
    let status_str: String = row.get("status");
    let status = MeetingStatus::parse(&status_str)
        .ok_or_else(|| StoreError::Database(format!("Unknown meeting status '{}'", status_str)))?;

    Ok(Meeting {
        meeting_id: row.get("meeting_id"),
        title: row.get("title"),
        description: row.get("description"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        room_id: row.get("room_id"),
        participant_ids: row.get("participant_ids"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

/// Map a write error to a unique violation when the database says so.
fn unique_or_db(err: sqlx::Error, unique_message: String) -> StoreError {
    let is_unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if is_unique {
        StoreError::UniqueViolation(unique_message)
    } else {
        StoreError::Database(err.to_string())
    }
}
