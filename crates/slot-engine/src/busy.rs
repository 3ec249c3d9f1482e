//! Busy time on a calendar date, read from the task store.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::error::Result;
use crate::interval::{merge_intervals, Interval};
use crate::store::TaskStore;
use crate::task::Task;

/// Midnight-to-midnight bounds of `date`. The end is the day's last representable instant.
pub fn day_bounds(date: NaiveDate) -> Interval {
    let start = date.and_time(NaiveTime::MIN);
    Interval::new(start, start + Duration::days(1) - Duration::nanoseconds(1))
}

fn clipped_to_day(tasks: &[Task], day: &Interval) -> Vec<Interval> {
    let mut intervals: Vec<Interval> = tasks
        .iter()
        .filter_map(Task::interval)
        .filter_map(|iv| iv.clip(day))
        .collect();
    intervals.sort_by_key(|iv| iv.start);
    intervals
}

/// Placed intervals of every task (event or todo) touching `date`, clipped to the day and
/// sorted by start. Not merged.
pub fn busy_intervals_for<S: TaskStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> Result<Vec<Interval>> {
    let day = day_bounds(date);
    let tasks = store.tasks_intersecting(day.start, day.end)?;
    Ok(clipped_to_day(&tasks, &day))
}

/// Fixed event intervals touching `date`, clipped to the day and merged.
pub fn event_intervals_for<S: TaskStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> Result<Vec<Interval>> {
    let day = day_bounds(date);
    let events = store.events_intersecting(day.start, day.end)?;
    Ok(merge_intervals(&clipped_to_day(&events, &day)))
}
