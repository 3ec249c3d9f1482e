//! End-to-end tests for a scheduling run against the in-memory store.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use slot_engine::{
    find_conflicts, slot_tasks, AvailabilityConfig, EngineConfig, MemoryStore, Phase, Placement,
    Result, Scheduler, SlotError, Task, TaskId, TaskStore, TimeWindow, Weights,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

/// 2026-03-02 is a Monday; day 2 = Mon, 3 = Tue, ...
fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

fn monday_8am() -> NaiveDateTime {
    at(2, 8, 0)
}

fn weekdays_nine_to_five() -> AvailabilityConfig {
    AvailabilityConfig::uniform(0..5, TimeWindow::hours_opt(9, 17).unwrap())
}

fn weights() -> Weights {
    Weights::new().with("priority", 1.0).with("deadline", 0.0)
}

fn span(store: &MemoryStore, id: TaskId) -> (NaiveDateTime, NaiveDateTime) {
    let t = store.get(id).expect("task must exist");
    (t.start_time.expect("start set"), t.end_time.expect("end set"))
}

fn run(
    store: &mut MemoryStore,
    availability: AvailabilityConfig,
    now: NaiveDateTime,
) -> slot_engine::RunReport {
    Scheduler::new(availability, weights())
        .run(store, now)
        .expect("run should succeed")
}

// ── Deadline phase ──────────────────────────────────────────────────────────

#[test]
fn single_task_lands_at_window_start() {
    let mut store = MemoryStore::new(vec![Task::todo(1, "write", 60)
        .with_priority(1)
        .with_deadline(at(2, 17, 0))]);

    let report = run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(span(&store, 1), (at(2, 9, 0), at(2, 10, 0)));
    assert_eq!(store.get(1).unwrap().scheduled_for, Some(at(2, 0, 0).date()));
    assert_eq!(report.get(1).unwrap().phase, Phase::Deadline);
}

#[test]
fn higher_priority_first_and_event_is_skipped() {
    let mut store = MemoryStore::new(vec![
        Task::event(1, "meeting", at(2, 10, 0), at(2, 11, 0)),
        Task::todo(2, "low", 60).with_priority(5).with_deadline(at(2, 17, 0)),
        Task::todo(3, "high", 60).with_priority(10).with_deadline(at(2, 17, 0)),
    ]);

    run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(span(&store, 3), (at(2, 9, 0), at(2, 10, 0)));
    assert_eq!(span(&store, 2), (at(2, 11, 0), at(2, 12, 0)));
}

#[test]
fn today_windows_start_no_earlier_than_now() {
    let mut store = MemoryStore::new(vec![Task::todo(1, "t", 60)]);

    run(&mut store, weekdays_nine_to_five(), at(2, 10, 15));

    assert_eq!(span(&store, 1), (at(2, 10, 15), at(2, 11, 15)));
}

#[test]
fn spills_to_next_available_day() {
    // 16:30 Monday leaves only 30 minutes today.
    let mut store = MemoryStore::new(vec![Task::todo(1, "t", 60)]);

    run(&mut store, weekdays_nine_to_five(), at(2, 16, 30));

    assert_eq!(span(&store, 1), (at(3, 9, 0), at(3, 10, 0)));
    assert_eq!(store.get(1).unwrap().scheduled_for, Some(at(3, 0, 0).date()));
}

#[test]
fn weekend_is_skipped() {
    // Friday 2026-03-06 after hours → next Monday 2026-03-09.
    let mut store = MemoryStore::new(vec![Task::todo(1, "t", 30)]);

    run(&mut store, weekdays_nine_to_five(), at(6, 18, 0));

    assert_eq!(span(&store, 1), (at(9, 9, 0), at(9, 9, 30)));
}

#[test]
fn placements_in_the_same_run_block_each_other() {
    let mut store = MemoryStore::new(vec![
        Task::todo(1, "a", 120).with_priority(3),
        Task::todo(2, "b", 120).with_priority(2),
        Task::todo(3, "c", 120).with_priority(1),
    ]);

    run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(span(&store, 1), (at(2, 9, 0), at(2, 11, 0)));
    assert_eq!(span(&store, 2), (at(2, 11, 0), at(2, 13, 0)));
    assert_eq!(span(&store, 3), (at(2, 13, 0), at(2, 15, 0)));
    assert!(find_conflicts(store.tasks()).is_empty());
}

#[test]
fn later_slot_used_when_earlier_gap_too_small() {
    let mut store = MemoryStore::new(vec![
        Task::event(1, "a", at(2, 9, 30), at(2, 12, 0)),
        Task::todo(2, "t", 45),
    ]);

    run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(span(&store, 2), (at(2, 12, 0), at(2, 12, 45)));
}

#[test]
fn deadline_on_a_later_day_is_reachable() {
    // Monday fully booked by an event; deadline Tuesday noon.
    let mut store = MemoryStore::new(vec![
        Task::event(1, "offsite", at(2, 9, 0), at(2, 17, 0)),
        Task::todo(2, "t", 60).with_deadline(at(3, 12, 0)),
    ]);

    let report = run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(span(&store, 2), (at(3, 9, 0), at(3, 10, 0)));
    assert_eq!(report.get(2).unwrap().phase, Phase::Deadline);
}

// ── Overflow phase ──────────────────────────────────────────────────────────

#[test]
fn unreachable_deadline_overflows_at_now() {
    let mut store = MemoryStore::new(vec![
        Task::todo(1, "t", 60).with_deadline(monday_8am() + Duration::minutes(30)),
    ]);

    let report = run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(span(&store, 1), (at(2, 8, 0), at(2, 9, 0)));
    assert_eq!(report.overflow_ids(), vec![1]);
}

#[test]
fn overflow_starts_after_todays_last_event() {
    let mut store = MemoryStore::new(vec![
        Task::event(1, "lunch", at(2, 12, 0), at(2, 13, 0)),
        Task::event(2, "review", at(2, 14, 0), at(2, 15, 30)),
        Task::todo(3, "t", 60).with_deadline(monday_8am() + Duration::minutes(30)),
    ]);

    run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(span(&store, 3), (at(2, 15, 30), at(2, 16, 30)));
}

#[test]
fn overflow_follows_last_event_even_when_already_over() {
    // The only event today ended before now; the chain still starts at its end.
    let mut store = MemoryStore::new(vec![
        Task::event(1, "early", at(2, 6, 0), at(2, 7, 0)),
        Task::todo(2, "t", 30).with_deadline(at(2, 7, 30)),
    ]);

    let report = run(&mut store, AvailabilityConfig::default(), monday_8am());

    assert_eq!(span(&store, 2), (at(2, 7, 0), at(2, 7, 30)));
    assert_eq!(report.overflow_ids(), vec![2]);
}

#[test]
fn past_deadline_goes_straight_to_overflow() {
    let mut store = MemoryStore::new(vec![Task::todo(1, "late", 30).with_deadline(at(1, 12, 0))]);

    let report = run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(report.overflow_ids(), vec![1]);
    assert_eq!(span(&store, 1), (at(2, 8, 0), at(2, 8, 30)));
}

#[test]
fn empty_availability_chains_everything_in_rank_order() {
    let mut store = MemoryStore::new(vec![
        Task::todo(1, "a", 30).with_priority(1),
        Task::todo(2, "b", 45).with_priority(3),
        Task::todo(3, "c", 60).with_priority(2),
    ]);

    let report = run(&mut store, AvailabilityConfig::default(), monday_8am());

    assert_eq!(report.overflow_ids(), vec![2, 3, 1]);
    assert_eq!(span(&store, 2), (at(2, 8, 0), at(2, 8, 45)));
    assert_eq!(span(&store, 3), (at(2, 8, 45), at(2, 9, 45)));
    assert_eq!(span(&store, 1), (at(2, 9, 45), at(2, 10, 15)));
    assert!(report.scan_ceiling_hits.is_empty());
}

#[test]
fn scan_ceiling_defers_tasks_without_deadline() {
    // Only Sunday is available, but the scan only covers Monday..Wednesday.
    let availability = AvailabilityConfig::uniform([6], TimeWindow::hours_opt(9, 17).unwrap());
    let mut store = MemoryStore::new(vec![Task::todo(1, "t", 30)]);

    let report = Scheduler::new(availability, weights())
        .with_config(EngineConfig { max_scan_days: 3 })
        .run(&mut store, monday_8am())
        .unwrap();

    assert_eq!(report.scan_ceiling_hits, vec![1]);
    assert_eq!(report.overflow_ids(), vec![1]);
    assert_eq!(span(&store, 1), (at(2, 8, 0), at(2, 8, 30)));
}

#[test]
fn overflow_tasks_mix_with_deadline_tasks() {
    let mut store = MemoryStore::new(vec![
        Task::todo(1, "fits", 60).with_priority(1),
        Task::todo(2, "too late", 60).with_priority(5).with_deadline(at(2, 8, 10)),
    ]);

    let report = run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(report.get(1).unwrap().phase, Phase::Deadline);
    assert_eq!(report.get(2).unwrap().phase, Phase::Overflow);
    assert_eq!(span(&store, 1), (at(2, 9, 0), at(2, 10, 0)));
    assert_eq!(span(&store, 2), (at(2, 8, 0), at(2, 9, 0)));
}

// ── Run lifecycle ───────────────────────────────────────────────────────────

#[test]
fn previous_placements_are_discarded() {
    let mut stale = Task::todo(1, "t", 60);
    stale.apply_placement(Placement::starting_at(at(4, 15, 0), 60));
    let mut store = MemoryStore::new(vec![stale]);

    run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(span(&store, 1), (at(2, 9, 0), at(2, 10, 0)));
}

#[test]
fn events_are_never_touched() {
    let event = Task::event(1, "fixed", at(2, 9, 0), at(2, 10, 0));
    let mut store = MemoryStore::new(vec![event.clone(), Task::todo(2, "t", 30)]);

    run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(store.get(1), Some(&event));
}

#[test]
fn rerunning_is_idempotent() {
    let mut store = MemoryStore::new(vec![
        Task::event(1, "fixed", at(2, 10, 0), at(2, 11, 0)),
        Task::todo(2, "a", 90).with_priority(2),
        Task::todo(3, "b", 30).with_priority(2),
        Task::todo(4, "c", 45).with_deadline(at(2, 8, 20)),
    ]);

    let first = run(&mut store, weekdays_nine_to_five(), monday_8am());
    let snapshot = store.tasks().to_vec();
    let second = run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(first, second);
    assert_eq!(store.tasks(), snapshot.as_slice());
}

#[test]
fn every_todo_gets_exact_estimate() {
    let mut store = MemoryStore::new(vec![
        Task::event(1, "fixed", at(2, 9, 0), at(2, 12, 0)),
        Task::todo(2, "a", 25),
        Task::todo(3, "b", 240),
        Task::todo(4, "c", 500),
        Task::todo(5, "d", 15).with_deadline(at(1, 0, 0)),
    ]);

    let report = run(&mut store, weekdays_nine_to_five(), monday_8am());

    assert_eq!(report.placements.len(), 4);
    for t in store.tasks().iter().filter(|t| t.is_todo()) {
        let (start, end) = span(&store, t.id);
        assert_eq!(end - start, Duration::minutes(i64::from(t.estimate.unwrap())));
        assert_eq!(t.scheduled_for, Some(start.date()));
    }
}

#[test]
fn slot_tasks_uses_given_now() {
    let mut store = MemoryStore::new(vec![Task::todo(1, "t", 60)]);

    let report = slot_tasks(
        &mut store,
        &weekdays_nine_to_five(),
        &weights(),
        Some(monday_8am()),
    )
    .unwrap();

    assert_eq!(report.now, monday_8am());
    assert_eq!(span(&store, 1), (at(2, 9, 0), at(2, 10, 0)));
}

#[test]
fn todo_without_estimate_is_rejected_before_reset() {
    let mut placed = Task::todo(1, "a", 30);
    placed.apply_placement(Placement::starting_at(at(2, 9, 0), 30));
    let mut unsized_todo = Task::todo(2, "b", 30);
    unsized_todo.estimate = None;
    let mut store = MemoryStore::new(vec![placed, unsized_todo]);

    let err = Scheduler::new(weekdays_nine_to_five(), weights())
        .run(&mut store, monday_8am())
        .unwrap_err();

    assert!(matches!(err, SlotError::InvalidTask { id: 2, .. }));
    assert_eq!(span(&store, 1), (at(2, 9, 0), at(2, 9, 30)));
    assert!(store.get(2).unwrap().placement().is_none());
}

#[test]
fn zero_estimate_is_rejected() {
    let mut store = MemoryStore::new(vec![Task::todo(1, "a", 0)]);

    let err = Scheduler::new(weekdays_nine_to_five(), weights())
        .run(&mut store, monday_8am())
        .unwrap_err();

    assert!(matches!(err, SlotError::InvalidTask { id: 1, .. }));
}

// ── Store failures ──────────────────────────────────────────────────────────

/// Fails every placement write after the first `allowed`.
struct FlakyStore {
    inner: MemoryStore,
    allowed: usize,
}

impl TaskStore for FlakyStore {
    fn todo_tasks(&self) -> Result<Vec<Task>> {
        self.inner.todo_tasks()
    }

    fn tasks_intersecting(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Task>> {
        self.inner.tasks_intersecting(start, end)
    }

    fn events_intersecting(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Task>> {
        self.inner.events_intersecting(start, end)
    }

    fn set_placement(&mut self, id: TaskId, placement: Placement) -> Result<()> {
        if self.allowed == 0 {
            return Err(SlotError::Store("disk full".to_string()));
        }
        self.allowed -= 1;
        self.inner.set_placement(id, placement)
    }

    fn clear_placements(&mut self, ids: &[TaskId]) -> Result<()> {
        self.inner.clear_placements(ids)
    }
}

#[test]
fn store_failure_aborts_and_keeps_committed_work() {
    let mut stale = Task::todo(3, "c", 30).with_priority(1);
    stale.apply_placement(Placement::starting_at(at(5, 9, 0), 30));
    let mut store = FlakyStore {
        inner: MemoryStore::new(vec![
            Task::todo(1, "a", 30).with_priority(3),
            Task::todo(2, "b", 30).with_priority(2),
            stale,
        ]),
        allowed: 1,
    };

    let err = Scheduler::new(weekdays_nine_to_five(), weights())
        .run(&mut store, monday_8am())
        .unwrap_err();

    assert!(matches!(err, SlotError::Store(_)));
    assert!(store.inner.get(1).unwrap().placement().is_some());
    assert!(store.inner.get(2).unwrap().placement().is_none());
    assert!(store.inner.get(3).unwrap().placement().is_none());
}
