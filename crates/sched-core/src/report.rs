//! Immutable scheduling reports.
//!
//! A [`SchedulingResult`] is built once by the scheduling service and
//! crosses the API boundary unchanged.

use serde::{Deserialize, Serialize};

use crate::model::Meeting;
use crate::solver::DecisionResult;

/// Decision outcome as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    Satisfiable,
    Unsatisfiable,
    Error,
}

/// Outcome of a scheduling request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingResult {
    /// Whether the request was admitted and persisted.
    pub success: bool,

    /// The persisted meeting on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<Meeting>,

    /// Static-check witnesses, one per violated constraint.
    pub constraint_violations: Vec<String>,

    /// Runtime-monitor findings raised while admitting the request. These
    /// surface concerns; they never revert persistence.
    pub runtime_warnings: Vec<String>,

    /// Decision outcome of the static check.
    pub solver_status: SolverStatus,

    /// Human-readable summary of the outcome.
    pub explanation: String,

    /// Wall-clock time the decision took, in milliseconds.
    pub solving_time_ms: i64,
}

impl SchedulingResult {
    /// An admitted request with its persisted meeting.
    pub fn success(meeting: Meeting, explanation: &str, solving_time_ms: i64) -> Self {
        SchedulingResult {
            success: true,
            meeting: Some(meeting),
            constraint_violations: Vec::new(),
            runtime_warnings: Vec::new(),
            solver_status: SolverStatus::Satisfiable,
            explanation: explanation.to_string(),
            solving_time_ms,
        }
    }

    /// A refused request with its witnesses.
    pub fn failure(violations: Vec<String>, explanation: &str, solving_time_ms: i64) -> Self {
        SchedulingResult {
            success: false,
            meeting: None,
            constraint_violations: violations,
            runtime_warnings: Vec::new(),
            solver_status: SolverStatus::Unsatisfiable,
            explanation: explanation.to_string(),
            solving_time_ms,
        }
    }

    /// A satisfiable planning query with no persisted meeting (batch
    /// verification).
    pub fn verified(explanation: &str, solving_time_ms: i64) -> Self {
        SchedulingResult {
            success: true,
            meeting: None,
            constraint_violations: Vec::new(),
            runtime_warnings: Vec::new(),
            solver_status: SolverStatus::Satisfiable,
            explanation: explanation.to_string(),
            solving_time_ms,
        }
    }

    /// A request refused because the decision backend itself failed.
    pub fn backend_error(message: &str, solving_time_ms: i64) -> Self {
        SchedulingResult {
            success: false,
            meeting: None,
            constraint_violations: vec![message.to_string()],
            runtime_warnings: Vec::new(),
            solver_status: SolverStatus::Error,
            explanation: "Decision backend failed".to_string(),
            solving_time_ms,
        }
    }

    /// Attach runtime-monitor findings to the result.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.runtime_warnings = warnings;
        self
    }

    /// Build the failure report matching an adverse [`DecisionResult`].
    ///
    /// Returns `None` for a satisfiable decision: success reports need the
    /// persisted meeting, which only the caller has.
    pub fn from_adverse_decision(decision: &DecisionResult, explanation: &str) -> Option<Self> {
        match decision {
            DecisionResult::Satisfiable { .. } => None,
            DecisionResult::Unsatisfiable {
                violations,
                solving_time_ms,
            } => Some(Self::failure(
                violations.clone(),
                explanation,
                *solving_time_ms,
            )),
            DecisionResult::Error {
                message,
                solving_time_ms,
            } => Some(Self::backend_error(message, *solving_time_ms)),
        }
    }
}
