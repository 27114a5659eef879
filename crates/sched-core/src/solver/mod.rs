//! Static constraint checking.
//!
//! Before any state change, a proposed meeting is checked for
//! satisfiability against the snapshot of confirmed meetings:
//!
//! - Room exclusivity: no two meetings in the same room may overlap
//! - Participant exclusivity: no participant may be double-booked
//! - Room capacity: the participant set must fit the room
//!
//! The [`encoder`] translates a proposal plus the snapshot into conflict
//! assertions; a [`DecisionBackend`] decides them and produces one
//! human-readable witness per violated constraint. The shipped backend
//! ([`IntervalBackend`]) is a direct algorithmic checker, but the encoding
//! and the push/pop assertion framing are designed so an SMT-style engine
//! can slot in behind the same trait when constraints outgrow linear
//! decidability (preferred rooms, soft priorities, multi-room packing).
//!
//! All times are compared as UTC epoch seconds over half-open intervals.

pub mod backend;
pub mod encoder;

pub use backend::IntervalBackend;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::Meeting;

/// Overlap predicate over half-open intervals `[start, end)`, in UTC epoch
/// seconds: `a.start < b.end && b.start < a.end`.
pub fn overlaps(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}

/// A half-open interval in UTC epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Start instant (inclusive).
    pub start: i64,
    /// End instant (exclusive).
    pub end: i64,
}

impl Interval {
    /// Whether this interval overlaps `other`.
    pub fn overlaps(&self, other: &Interval) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }
}

/// A proposed meeting, normalized for the static check.
///
/// `meeting_id` is set when the proposal is an update of a persisted
/// meeting; the checker then excludes that meeting from the snapshot, so an
/// update that does not move the interval decides as satisfiable.
#[derive(Debug, Clone)]
pub struct SchedulingConstraint {
    /// Persisted meeting id when this proposal is an update.
    pub meeting_id: Option<Uuid>,

    /// Requested room.
    pub room_id: Uuid,

    /// Capacity of the requested room.
    pub room_capacity: i32,

    /// Requested start instant.
    pub start: DateTime<Utc>,

    /// Requested end instant.
    pub end: DateTime<Utc>,

    /// Requested participant set.
    pub participant_ids: Vec<Uuid>,
}

impl SchedulingConstraint {
    /// The requested interval in UTC epoch seconds.
    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start.timestamp(),
            end: self.end.timestamp(),
        }
    }
}

/// An existing meeting as seen by the static check.
///
/// Only the fields the constraints mention are carried; this is the shape
/// of the confirmed snapshot handed to [`DecisionBackend::check_feasibility`].
#[derive(Debug, Clone)]
pub struct BookedMeeting {
    /// Meeting id.
    pub meeting_id: Uuid,

    /// Booked room.
    pub room_id: Uuid,

    /// Start instant.
    pub start: DateTime<Utc>,

    /// End instant.
    pub end: DateTime<Utc>,

    /// Participant ids.
    pub participant_ids: Vec<Uuid>,
}

impl BookedMeeting {
    /// The booked interval in UTC epoch seconds.
    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start.timestamp(),
            end: self.end.timestamp(),
        }
    }
}

impl From<&Meeting> for BookedMeeting {
    fn from(meeting: &Meeting) -> Self {
        BookedMeeting {
            meeting_id: meeting.meeting_id,
            room_id: meeting.room_id,
            start: meeting.start_time,
            end: meeting.end_time,
            participant_ids: meeting.participant_ids.clone(),
        }
    }
}

/// Outcome of a decision-backend call.
///
/// A tagged variant is used instead of an error type because an
/// unsatisfiable check is a normal, expected outcome; `Error` is reserved
/// for backend failures (e.g. the solving deadline elapsing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionResult {
    /// The combined constraint set is satisfiable; scheduling is admissible.
    Satisfiable {
        /// Wall-clock time the decision took, in milliseconds.
        solving_time_ms: i64,
    },

    /// At least one constraint is violated.
    Unsatisfiable {
        /// One human-readable witness per violated constraint.
        violations: Vec<String>,
        /// Wall-clock time the decision took, in milliseconds.
        solving_time_ms: i64,
    },

    /// The backend itself failed.
    Error {
        /// Failure description.
        message: String,
        /// Wall-clock time spent before the failure, in milliseconds.
        solving_time_ms: i64,
    },
}

impl DecisionResult {
    /// Whether the check decided satisfiable.
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, DecisionResult::Satisfiable { .. })
    }

    /// The witnesses of an unsatisfiable check; empty otherwise.
    pub fn violations(&self) -> &[String] {
        match self {
            DecisionResult::Unsatisfiable { violations, .. } => violations,
            _ => &[],
        }
    }

    /// Wall-clock solving time in milliseconds.
    pub fn solving_time_ms(&self) -> i64 {
        match self {
            DecisionResult::Satisfiable { solving_time_ms }
            | DecisionResult::Unsatisfiable {
                solving_time_ms, ..
            }
            | DecisionResult::Error {
                solving_time_ms, ..
            } => *solving_time_ms,
        }
    }
}

/// A decision backend: any engine that decides satisfiability of the
/// encoded constraint set and produces per-constraint witnesses.
///
/// Implementations must serialize their own decision calls (a mutex around
/// each check is acceptable) and must honor the live enable switch: while
/// disabled, `check_feasibility` and `check_batch` return
/// `Satisfiable { solving_time_ms: 0 }` unconditionally, pre-checks
/// included. This permits runtime comparison of the verified and unverified
/// regimes without a redeploy.
pub trait DecisionBackend: Send + Sync {
    /// Decide admissibility of `proposed` against the confirmed snapshot.
    fn check_feasibility(
        &self,
        proposed: &SchedulingConstraint,
        existing: &[BookedMeeting],
    ) -> DecisionResult;

    /// Decide a batch of proposals: each against the snapshot, then every
    /// ordered pair among the proposals. Witnesses reference proposals by
    /// their 0-based index.
    fn check_batch(
        &self,
        proposals: &[SchedulingConstraint],
        existing: &[BookedMeeting],
    ) -> DecisionResult;

    /// Flip the live enable switch.
    fn set_enabled(&self, enabled: bool);

    /// Current state of the enable switch.
    fn is_enabled(&self) -> bool;
}
