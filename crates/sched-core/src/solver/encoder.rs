//! Constraint encoder.
//!
//! Translates a proposed meeting plus the confirmed snapshot into conflict
//! assertions for the decision backend, and produces the human-readable
//! witness attached to each assertion. Two shape constraints are decided
//! here as a fast path, before any backend dispatch:
//!
//! 1. `start < end`
//! 2. `|participants| <= room capacity`

use chrono::{DateTime, SecondsFormat, Utc};

use super::{BookedMeeting, Interval, SchedulingConstraint};

/// A single conflict assertion: the hypothesis that the proposed booking
/// and one existing booking both hold. The backend asserts it inside its
/// own push/pop frame and reports `witness` when the hypothesis is
/// contradictory (the intervals overlap).
#[derive(Debug, Clone)]
pub struct ConflictAssertion {
    /// Interval claimed by the proposal.
    pub proposed: Interval,

    /// Interval claimed by the existing booking.
    pub existing: Interval,

    /// Witness reported when the assertion fails.
    pub witness: String,
}

/// Fast-path shape checks, run before any backend dispatch.
///
/// Returns one witness per violated check, in check order.
pub fn pre_check(proposed: &SchedulingConstraint) -> Vec<String> {
    let mut violations = Vec::new();

    if proposed.start >= proposed.end {
        violations.push("Invalid time range".to_string());
    }

    let requested = proposed.participant_ids.len();
    if requested as i64 > i64::from(proposed.room_capacity) {
        violations.push(format!(
            "Room capacity exceeded: {} requested, capacity {}",
            requested, proposed.room_capacity
        ));
    }

    violations
}

/// Encode a proposal against the confirmed snapshot.
///
/// Emits one assertion per candidate conflict: same room, or each shared
/// participant. A snapshot entry whose id equals `proposed.meeting_id` is
/// the proposal's own persisted row and is skipped, which is what makes an
/// update that merely changes a title decide as satisfiable.
pub fn encode_feasibility(
    proposed: &SchedulingConstraint,
    existing: &[BookedMeeting],
) -> Vec<ConflictAssertion> {
    let mut assertions = Vec::new();
    let interval = proposed.interval();

    for booked in existing {
        if proposed.meeting_id == Some(booked.meeting_id) {
            continue;
        }

        if booked.room_id == proposed.room_id {
            assertions.push(ConflictAssertion {
                proposed: interval,
                existing: booked.interval(),
                witness: format!(
                    "Room conflict: overlaps with meeting {} in room {} ({}\u{2013}{})",
                    booked.meeting_id,
                    booked.room_id,
                    fmt_instant(&booked.start),
                    fmt_instant(&booked.end),
                ),
            });
        }

        for participant_id in &proposed.participant_ids {
            if booked.participant_ids.contains(participant_id) {
                assertions.push(ConflictAssertion {
                    proposed: interval,
                    existing: booked.interval(),
                    witness: format!(
                        "Participant conflict: participant {} already booked in meeting {} ({}\u{2013}{})",
                        participant_id,
                        booked.meeting_id,
                        fmt_instant(&booked.start),
                        fmt_instant(&booked.end),
                    ),
                });
            }
        }
    }

    assertions
}

/// Encode the pairwise constraints among a batch of proposals.
///
/// Every ordered pair `(i, j)` with `i < j` is checked for room and
/// participant conflicts; witnesses reference proposals by 0-based index.
/// Constraints of each proposal against the snapshot are encoded separately
/// via [`encode_feasibility`].
pub fn encode_batch_pairs(proposals: &[SchedulingConstraint]) -> Vec<ConflictAssertion> {
    let mut assertions = Vec::new();

    for (i, a) in proposals.iter().enumerate() {
        for (j, b) in proposals.iter().enumerate().skip(i + 1) {
            if a.room_id == b.room_id {
                assertions.push(ConflictAssertion {
                    proposed: a.interval(),
                    existing: b.interval(),
                    witness: format!(
                        "Room conflict: proposal {} overlaps proposal {} in room {}",
                        i, j, a.room_id
                    ),
                });
            }

            for participant_id in &a.participant_ids {
                if b.participant_ids.contains(participant_id) {
                    assertions.push(ConflictAssertion {
                        proposed: a.interval(),
                        existing: b.interval(),
                        witness: format!(
                            "Participant conflict: participant {} double-booked by proposals {} and {}",
                            participant_id, i, j
                        ),
                    });
                }
            }
        }
    }

    assertions
}

fn fmt_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
