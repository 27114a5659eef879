//! Property-based tests over arbitrary admitted histories.
//!
//! Random proposal sequences are pushed through the decision backend the
//! way the scheduling service uses it: a proposal that decides
//! satisfiable joins the confirmed snapshot, a refused one vanishes. The
//! resource-exclusivity invariants must then hold over every admitted
//! history, regardless of the order or shape of the proposals.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use sched_core::monitor::{LifecycleMonitor, MeetingObservation};
use sched_core::solver::{
    overlaps, BookedMeeting, DecisionBackend, IntervalBackend, SchedulingConstraint,
};

/// Fixed room pool with distinct capacities.
const ROOM_CAPACITIES: [i32; 3] = [1, 3, 10];

/// 15-minute slot grid anchored at an arbitrary fixed instant.
const BASE_EPOCH: i64 = 1_893_456_000; // 2030-01-01T00:00:00Z
const SLOT_SECONDS: i64 = 15 * 60;

fn room_id(index: usize) -> Uuid {
    Uuid::from_u128(0x1000 + index as u128)
}

fn participant_id(index: usize) -> Uuid {
    Uuid::from_u128(0x2000 + index as u128)
}

fn instant(slot: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(BASE_EPOCH + slot * SLOT_SECONDS, 0).unwrap()
}

/// One generated proposal: room index, participant indices, start slot,
/// duration in slots.
#[derive(Debug, Clone)]
struct GeneratedProposal {
    room: usize,
    participants: BTreeSet<usize>,
    start_slot: i64,
    duration_slots: i64,
}

fn proposal_strategy() -> impl Strategy<Value = GeneratedProposal> {
    (
        0..ROOM_CAPACITIES.len(),
        prop::collection::btree_set(0..6usize, 1..4),
        0i64..96,
        1i64..8,
    )
        .prop_map(|(room, participants, start_slot, duration_slots)| GeneratedProposal {
            room,
            participants,
            start_slot,
            duration_slots,
        })
}

fn constraint_of(proposal: &GeneratedProposal) -> SchedulingConstraint {
    SchedulingConstraint {
        meeting_id: None,
        room_id: room_id(proposal.room),
        room_capacity: ROOM_CAPACITIES
            .get(proposal.room)
            .copied()
            .unwrap_or(1),
        start: instant(proposal.start_slot),
        end: instant(proposal.start_slot + proposal.duration_slots),
        participant_ids: proposal.participants.iter().map(|i| participant_id(*i)).collect(),
    }
}

/// Run a history: admit every satisfiable proposal into the confirmed
/// snapshot, exactly as the service does on create-then-confirm.
fn admit_history(proposals: &[GeneratedProposal]) -> Vec<BookedMeeting> {
    let backend = IntervalBackend::default();
    let mut confirmed: Vec<BookedMeeting> = Vec::new();

    for (index, proposal) in proposals.iter().enumerate() {
        let constraint = constraint_of(proposal);
        if backend
            .check_feasibility(&constraint, &confirmed)
            .is_satisfiable()
        {
            confirmed.push(BookedMeeting {
                meeting_id: Uuid::from_u128(0x9000 + index as u128),
                room_id: constraint.room_id,
                start: constraint.start,
                end: constraint.end,
                participant_ids: constraint.participant_ids.clone(),
            });
        }
    }

    confirmed
}

proptest! {
    /// Room exclusivity: no two admitted meetings in the same room
    /// overlap.
    #[test]
    fn admitted_history_has_room_exclusivity(
        proposals in prop::collection::vec(proposal_strategy(), 1..40)
    ) {
        let confirmed = admit_history(&proposals);
        for (i, a) in confirmed.iter().enumerate() {
            for b in confirmed.iter().skip(i + 1) {
                if a.room_id == b.room_id {
                    let (a_start, a_end) = (a.start.timestamp(), a.end.timestamp());
                    let (b_start, b_end) = (b.start.timestamp(), b.end.timestamp());
                    prop_assert!(
                        !overlaps(a_start, a_end, b_start, b_end),
                        "meetings {} and {} overlap in room {}",
                        a.meeting_id,
                        b.meeting_id,
                        a.room_id
                    );
                }
            }
        }
    }

    /// Participant exclusivity: no participant is double-booked across
    /// admitted meetings.
    #[test]
    fn admitted_history_has_participant_exclusivity(
        proposals in prop::collection::vec(proposal_strategy(), 1..40)
    ) {
        let confirmed = admit_history(&proposals);
        for (i, a) in confirmed.iter().enumerate() {
            for b in confirmed.iter().skip(i + 1) {
                let shares_participant = a
                    .participant_ids
                    .iter()
                    .any(|p| b.participant_ids.contains(p));
                if shares_participant {
                    let (a_start, a_end) = (a.start.timestamp(), a.end.timestamp());
                    let (b_start, b_end) = (b.start.timestamp(), b.end.timestamp());
                    prop_assert!(!overlaps(a_start, a_end, b_start, b_end));
                }
            }
        }
    }

    /// Capacity: every admitted meeting fit its room at admission time.
    #[test]
    fn admitted_history_respects_capacity(
        proposals in prop::collection::vec(proposal_strategy(), 1..40)
    ) {
        let confirmed = admit_history(&proposals);
        for booked in &confirmed {
            let capacity = ROOM_CAPACITIES
                .iter()
                .enumerate()
                .find(|(index, _)| room_id(*index) == booked.room_id)
                .map(|(_, capacity)| *capacity)
                .unwrap();
            prop_assert!(booked.participant_ids.len() as i64 <= i64::from(capacity));
        }
    }

    /// Idempotence: deciding the same proposal against the same snapshot
    /// twice yields the same verdict and witnesses.
    #[test]
    fn feasibility_check_is_idempotent(
        proposals in prop::collection::vec(proposal_strategy(), 1..20),
        probe in proposal_strategy()
    ) {
        let confirmed = admit_history(&proposals);
        let backend = IntervalBackend::default();
        let constraint = constraint_of(&probe);

        let first = backend.check_feasibility(&constraint, &confirmed);
        let second = backend.check_feasibility(&constraint, &confirmed);

        prop_assert_eq!(first.is_satisfiable(), second.is_satisfiable());
        prop_assert_eq!(first.violations(), second.violations());
    }

    /// Update self-exclusion: re-proposing an admitted meeting unchanged,
    /// with its own id set, decides satisfiable against a snapshot that
    /// contains it.
    #[test]
    fn admitted_meeting_reproposal_is_satisfiable(
        proposals in prop::collection::vec(proposal_strategy(), 1..40)
    ) {
        let confirmed = admit_history(&proposals);
        let backend = IntervalBackend::default();

        for booked in &confirmed {
            let capacity = ROOM_CAPACITIES
                .iter()
                .enumerate()
                .find(|(index, _)| room_id(*index) == booked.room_id)
                .map(|(_, capacity)| *capacity)
                .unwrap();
            let as_proposed = SchedulingConstraint {
                meeting_id: Some(booked.meeting_id),
                room_id: booked.room_id,
                room_capacity: capacity,
                start: booked.start,
                end: booked.end,
                participant_ids: booked.participant_ids.clone(),
            };
            prop_assert!(backend
                .check_feasibility(&as_proposed, &confirmed)
                .is_satisfiable());
        }
    }

    /// Deduplication: replaying the same create into the monitor raises
    /// each violation at most once in the global log.
    #[test]
    fn monitor_deduplicates_replayed_findings(
        proposal in proposal_strategy(),
        replays in 2usize..5
    ) {
        let monitor = LifecycleMonitor::new();
        let constraint = constraint_of(&proposal);
        let observation = MeetingObservation {
            meeting_id: Uuid::from_u128(0x7000),
            room_id: constraint.room_id,
            // Force a capacity finding regardless of the generated set.
            room_capacity: 0,
            start_time: constraint.start,
            end_time: constraint.end,
            participant_count: constraint.participant_ids.len(),
        };

        for _ in 0..replays {
            monitor.on_create(&observation);
        }

        let violations = monitor.violations();
        prop_assert_eq!(violations.len(), 1);
    }
}
