//! Availability finder.
//!
//! Enumerates candidate start slots for a requested duration by walking a
//! cursor over a room's confirmed timeline on a fixed grid (default 15
//! minutes). Best-effort helper: the slots it emits were free in the
//! snapshot it scanned, nothing more.

use chrono::{DateTime, Utc};

use sched_core::solver::overlaps;

/// A busy interval in UTC epoch seconds, sorted by start.
#[derive(Debug, Clone, Copy)]
pub struct BusySlot {
    pub start: i64,
    pub end: i64,
}

/// Round `t` up to the next grid point (grid anchored at the UTC epoch).
fn round_up_to_grid(t: i64, increment: i64) -> i64 {
    let remainder = t.rem_euclid(increment);
    if remainder == 0 {
        t
    } else {
        t + (increment - remainder)
    }
}

/// Enumerate free `[cursor, cursor + duration)` slots on the grid.
///
/// The cursor starts at `search_start` rounded up to the grid and advances
/// one increment per emitted slot. On collision with a busy slot the
/// cursor jumps directly to that slot's end and re-aligns to the grid.
/// Slots are emitted while `cursor + duration <= search_end`.
pub fn free_slots(
    busy: &[BusySlot],
    duration_secs: i64,
    increment_secs: i64,
    search_start: i64,
    search_end: i64,
) -> Vec<(i64, i64)> {
    let mut slots = Vec::new();
    if duration_secs <= 0 || increment_secs <= 0 {
        return slots;
    }

    let mut cursor = round_up_to_grid(search_start, increment_secs);
    while cursor + duration_secs <= search_end {
        let candidate_end = cursor + duration_secs;
        match busy
            .iter()
            .find(|slot| overlaps(cursor, candidate_end, slot.start, slot.end))
        {
            None => {
                slots.push((cursor, candidate_end));
                cursor += increment_secs;
            }
            Some(blocking) => {
                // Jump past the blocking slot and re-align. The blocking
                // slot ends strictly after the cursor, so this always
                // makes progress.
                cursor = round_up_to_grid(blocking.end, increment_secs);
            }
        }
    }

    slots
}

/// Busy slots for a set of meeting intervals, sorted by start.
pub fn busy_slots(intervals: impl IntoIterator<Item = (DateTime<Utc>, DateTime<Utc>)>) -> Vec<BusySlot> {
    let mut slots: Vec<BusySlot> = intervals
        .into_iter()
        .map(|(start, end)| BusySlot {
            start: start.timestamp(),
            end: end.timestamp(),
        })
        .collect();
    slots.sort_by_key(|slot| slot.start);
    slots
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const MIN: i64 = 60;
    const INC: i64 = 15 * MIN;
    const HOUR: i64 = 60 * MIN;

    #[test]
    fn test_round_up_to_grid() {
        assert_eq!(round_up_to_grid(0, INC), 0);
        assert_eq!(round_up_to_grid(1, INC), INC);
        assert_eq!(round_up_to_grid(INC, INC), INC);
        assert_eq!(round_up_to_grid(INC + 1, INC), 2 * INC);
    }

    #[test]
    fn test_empty_timeline_emits_grid_of_slots() {
        // Two-hour window, one-hour duration: start points at :00, :15,
        // :30, :45 and :60.
        let slots = free_slots(&[], HOUR, INC, 0, 2 * HOUR);
        assert_eq!(slots.len(), 5);
        assert_eq!(slots.first().copied(), Some((0, HOUR)));
        assert_eq!(slots.last().copied(), Some((HOUR, 2 * HOUR)));
    }

    #[test]
    fn test_busy_slot_is_skipped() {
        // Busy [1h, 2h): nothing may overlap it.
        let busy = [BusySlot {
            start: HOUR,
            end: 2 * HOUR,
        }];
        let slots = free_slots(&busy, HOUR, INC, 0, 3 * HOUR);

        assert!(slots.contains(&(0, HOUR)));
        assert!(slots.contains(&(2 * HOUR, 3 * HOUR)));
        assert!(slots
            .iter()
            .all(|(start, end)| !overlaps(*start, *end, HOUR, 2 * HOUR)));
    }

    #[test]
    fn test_cursor_jumps_to_busy_end_on_grid() {
        // Busy slot ending off-grid at 1h10m: next candidate start is
        // 1h15m, not a sweep of blocked positions.
        let busy = [BusySlot {
            start: 0,
            end: HOUR + 10 * MIN,
        }];
        let slots = free_slots(&busy, 30 * MIN, INC, 0, 3 * HOUR);

        assert_eq!(
            slots.first().copied(),
            Some((HOUR + 15 * MIN, HOUR + 45 * MIN))
        );
    }

    #[test]
    fn test_search_start_is_aligned_up() {
        let slots = free_slots(&[], HOUR, INC, 7 * MIN, 2 * HOUR);
        assert_eq!(slots.first().copied(), Some((INC, INC + HOUR)));
    }

    #[test]
    fn test_duration_must_fit_window() {
        let slots = free_slots(&[], 2 * HOUR, INC, 0, HOUR);
        assert!(slots.is_empty());
    }

    #[test]
    fn test_back_to_back_busy_slots() {
        let busy = [
            BusySlot {
                start: 0,
                end: HOUR,
            },
            BusySlot {
                start: HOUR,
                end: 2 * HOUR,
            },
        ];
        let slots = free_slots(&busy, HOUR, INC, 0, 3 * HOUR);
        assert_eq!(slots, vec![(2 * HOUR, 3 * HOUR)]);
    }

    #[test]
    fn test_degenerate_inputs_emit_nothing() {
        assert!(free_slots(&[], 0, INC, 0, HOUR).is_empty());
        assert!(free_slots(&[], HOUR, 0, 0, HOUR).is_empty());
    }

    #[test]
    fn test_busy_slots_sorts_by_start() {
        use chrono::TimeZone;
        let later = Utc.with_ymd_and_hms(2030, 1, 1, 14, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap();
        let slots = busy_slots(vec![
            (later, later + chrono::Duration::hours(1)),
            (earlier, earlier + chrono::Duration::hours(1)),
        ]);
        assert_eq!(slots.first().unwrap().start, earlier.timestamp());
    }
}
