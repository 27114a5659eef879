//! Direct algorithmic decision backend.
//!
//! Decides the encoded constraint set without an external SMT process: each
//! conflict assertion is asserted inside its own push/pop frame and
//! evaluated over fixed epoch-second intervals. The framing keeps the
//! calling convention of an incremental solver, so callers can add
//! hypotheses and retract them without rebuilding the full formula, and an
//! SMT-backed implementation can replace this one behind the same trait.
//!
//! Decision calls are serialized by a mutex around the assertion context;
//! the context is stateless between invocations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::encoder::{self, ConflictAssertion};
use super::{BookedMeeting, DecisionBackend, DecisionResult, Interval, SchedulingConstraint};

/// Default hard deadline for one decision call.
pub const DEFAULT_SOLVER_TIMEOUT: Duration = Duration::from_secs(5);

/// An assertion active in the current context.
#[derive(Debug, Clone, Copy)]
struct ActiveAssertion {
    lhs: Interval,
    rhs: Interval,
}

impl ActiveAssertion {
    /// The asserted hypothesis is that both bookings hold; it is
    /// contradictory exactly when the intervals overlap.
    fn contradicts(&self) -> bool {
        self.lhs.overlaps(&self.rhs)
    }
}

/// Incremental assertion context with push/pop framing.
#[derive(Debug, Default)]
struct AssertionContext {
    assertions: Vec<ActiveAssertion>,
    frames: Vec<usize>,
}

impl AssertionContext {
    /// Open a new frame.
    fn push(&mut self) {
        self.frames.push(self.assertions.len());
    }

    /// Discard every assertion added since the matching `push`.
    fn pop(&mut self) {
        if let Some(mark) = self.frames.pop() {
            self.assertions.truncate(mark);
        }
    }

    /// Add an assertion to the current frame.
    fn assert(&mut self, lhs: Interval, rhs: Interval) {
        self.assertions.push(ActiveAssertion { lhs, rhs });
    }

    /// Whether any active assertion is contradictory.
    fn has_contradiction(&self) -> bool {
        self.assertions.iter().any(ActiveAssertion::contradicts)
    }

    /// Context must be empty between decision calls.
    fn reset(&mut self) {
        self.assertions.clear();
        self.frames.clear();
    }
}

/// The shipped decision backend.
///
/// Carries the live enable switch: while disabled, every check returns
/// `Satisfiable { solving_time_ms: 0 }` without evaluating anything.
pub struct IntervalBackend {
    enabled: AtomicBool,
    timeout: Duration,
    context: Mutex<AssertionContext>,
}

impl Default for IntervalBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SOLVER_TIMEOUT)
    }
}

impl IntervalBackend {
    /// Create an enabled backend with the given hard deadline per call.
    pub fn new(timeout: Duration) -> Self {
        IntervalBackend {
            enabled: AtomicBool::new(true),
            timeout,
            context: Mutex::new(AssertionContext::default()),
        }
    }

    /// Evaluate a set of encoded assertions, one frame per assertion,
    /// collecting the witness of every contradiction.
    fn evaluate(
        &self,
        assertions: &[ConflictAssertion],
        deadline: Instant,
    ) -> Result<Vec<String>, String> {
        let mut context = self.context.lock();
        context.reset();

        let mut witnesses = Vec::new();
        for assertion in assertions {
            if Instant::now() > deadline {
                context.reset();
                return Err("solver timeout".to_string());
            }

            context.push();
            context.assert(assertion.proposed, assertion.existing);
            if context.has_contradiction() {
                witnesses.push(assertion.witness.clone());
            }
            context.pop();
        }

        Ok(witnesses)
    }

    fn decide(
        &self,
        pre_violations: Vec<String>,
        assertions: Vec<ConflictAssertion>,
        started: Instant,
    ) -> DecisionResult {
        if !pre_violations.is_empty() {
            return DecisionResult::Unsatisfiable {
                violations: pre_violations,
                solving_time_ms: elapsed_ms(started),
            };
        }

        let deadline = started + self.timeout;
        match self.evaluate(&assertions, deadline) {
            Ok(witnesses) if witnesses.is_empty() => DecisionResult::Satisfiable {
                solving_time_ms: elapsed_ms(started),
            },
            Ok(witnesses) => DecisionResult::Unsatisfiable {
                violations: witnesses,
                solving_time_ms: elapsed_ms(started),
            },
            Err(message) => {
                warn!(
                    target: "sched.solver",
                    error = %message,
                    "Decision backend failed"
                );
                DecisionResult::Error {
                    message,
                    solving_time_ms: elapsed_ms(started),
                }
            }
        }
    }
}

impl DecisionBackend for IntervalBackend {
    fn check_feasibility(
        &self,
        proposed: &SchedulingConstraint,
        existing: &[BookedMeeting],
    ) -> DecisionResult {
        if !self.is_enabled() {
            return DecisionResult::Satisfiable { solving_time_ms: 0 };
        }

        let started = Instant::now();
        let pre_violations = encoder::pre_check(proposed);
        let assertions = if pre_violations.is_empty() {
            encoder::encode_feasibility(proposed, existing)
        } else {
            Vec::new()
        };

        debug!(
            target: "sched.solver",
            room_id = %proposed.room_id,
            candidates = existing.len(),
            assertions = assertions.len(),
            "Checking feasibility"
        );

        self.decide(pre_violations, assertions, started)
    }

    fn check_batch(
        &self,
        proposals: &[SchedulingConstraint],
        existing: &[BookedMeeting],
    ) -> DecisionResult {
        if !self.is_enabled() {
            return DecisionResult::Satisfiable { solving_time_ms: 0 };
        }

        let started = Instant::now();

        let mut pre_violations = Vec::new();
        let mut assertions = Vec::new();
        for (index, proposal) in proposals.iter().enumerate() {
            for violation in encoder::pre_check(proposal) {
                pre_violations.push(format!("Proposal {}: {}", index, violation));
            }
            for assertion in encoder::encode_feasibility(proposal, existing) {
                assertions.push(ConflictAssertion {
                    witness: format!("Proposal {}: {}", index, assertion.witness),
                    ..assertion
                });
            }
        }
        assertions.extend(encoder::encode_batch_pairs(proposals));

        self.decide(pre_violations, assertions, started)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        debug!(target: "sched.solver", enabled, "Decision backend toggled");
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}
