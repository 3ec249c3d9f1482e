//! Compute free time slots from availability windows and busy intervals.
//!
//! Busy periods are merged first, then each availability window is walked on its own with
//! a cursor. A free slot never spans two windows, even when the windows touch.

use chrono::{Duration, NaiveDateTime};

use crate::interval::{merge_intervals, Interval};

/// Subtract `busy` from each window of `windows`.
///
/// Windows are processed in the order given. Each returned slot lies inside exactly one
/// window and intersects no busy interval.
pub fn free_slots(windows: &[Interval], busy: &[Interval]) -> Vec<Interval> {
    let merged = merge_intervals(busy);
    let mut slots = Vec::new();

    for window in windows {
        let mut cursor = window.start;
        for b in &merged {
            if b.end <= cursor {
                continue;
            }
            if b.start >= window.end {
                break;
            }
            if b.start > cursor {
                slots.push(Interval::new(cursor, b.start));
            }
            cursor = cursor.max(b.end);
            if cursor >= window.end {
                break;
            }
        }

        // Trailing free slot after the last busy period.
        if cursor < window.end {
            slots.push(Interval::new(cursor, window.end));
        }
    }

    slots
}

/// First placement of `minutes` inside `slots` that starts no earlier than `earliest` and,
/// when a deadline is given, ends no later than it.
///
/// Slots are tried in order. The candidate start is the later of the slot start and
/// `earliest`; it is accepted only if the whole duration fits in the slot.
pub fn find_first_fit(
    slots: &[Interval],
    earliest: NaiveDateTime,
    minutes: u32,
    deadline: Option<NaiveDateTime>,
) -> Option<Interval> {
    let duration = Duration::minutes(i64::from(minutes));
    slots.iter().find_map(|slot| {
        let start = slot.start.max(earliest);
        let end = start + duration;
        let fits_slot = end <= slot.end;
        let meets_deadline = deadline.is_none_or(|d| end <= d);
        (fits_slot && meets_deadline).then_some(Interval::new(start, end))
    })
}
