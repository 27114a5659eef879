//! Verification core for the room scheduler.
//!
//! This library contains the pieces of the scheduler that decide and
//! observe, with no I/O of their own:
//!
//! - `model` - Domain entities (rooms, participants, meetings) and the
//!   meeting status machine
//! - `solver` - Static constraint checking: the constraint encoder and the
//!   decision backend that admits or refuses a proposed meeting against the
//!   confirmed snapshot
//! - `monitor` - Runtime lifecycle monitor: an in-memory observer of every
//!   state transition, validating temporal correctness properties and
//!   keeping a deduplicated violation log
//! - `report` - Immutable result records returned across the API boundary
//!
//! # Architecture
//!
//! The hosting service sequences the two verification layers:
//!
//! ```text
//! request -> solver (before any state change) -> store -> monitor (after)
//! ```
//!
//! The solver is a gate: nothing is persisted on an unsatisfiable check.
//! The monitor is an observer: its findings surface as warnings and never
//! revert persistence, except where the service explicitly consults it
//! (meeting deletion).

pub mod model;
pub mod monitor;
pub mod report;
pub mod solver;

pub use model::{Meeting, MeetingStatus, Participant, Room};
pub use monitor::{LifecycleMonitor, MeetingObservation, PropertyViolation, Severity};
pub use report::{SchedulingResult, SolverStatus};
pub use solver::{
    BookedMeeting, DecisionBackend, DecisionResult, IntervalBackend, SchedulingConstraint,
};
