//! Two-phase greedy placement of every `Todo` task.
//!
//! A run goes through these steps:
//!
//! 1. **Reset**: clear the scheduling triple of every todo and commit.
//! 2. **Rank**: score every todo at one fixed `now`; order by descending score, then by
//!    ascending id.
//! 3. **Deadline phase**: for each task in rank order, scan days forward from today and take
//!    the first free slot that fits the estimate and finishes by the deadline. Each placement
//!    is committed immediately and is busy time for every later task.
//! 4. **Overflow phase**: tasks the deadline phase could not place are chained back to back,
//!    starting after today's last fixed event (or at `now`), ignoring availability and
//!    deadlines.
//!
//! Every todo ends up with concrete times. The only failure is a store error, which aborts
//! the run with the placements committed so far left in place. Re-running from scratch is
//! always safe because of the reset step.

use std::collections::HashMap;

use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::availability::AvailabilityConfig;
use crate::busy::{busy_intervals_for, day_bounds, event_intervals_for};
use crate::error::Result;
use crate::freebusy::{find_first_fit, free_slots};
use crate::interval::Interval;
use crate::score::{rank, Weights};
use crate::store::TaskStore;
use crate::task::{Placement, Task, TaskId};

/// Upper bound on how many days the deadline phase scans for one task.
pub const DEFAULT_MAX_SCAN_DAYS: u32 = 366;

/// Tunables of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Days (today included) the deadline phase may scan before deferring a task to overflow.
    pub max_scan_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_scan_days: DEFAULT_MAX_SCAN_DAYS,
        }
    }
}

/// Which pass placed a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Inside an availability window, finishing by the deadline.
    Deadline,
    /// Back-to-back fallback chain.
    Overflow,
}

/// One committed placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTask {
    pub id: TaskId,
    pub phase: Phase,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Outcome of a completed run, placements in commit order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub now: NaiveDateTime,
    pub placements: Vec<PlacedTask>,
    /// Tasks without a deadline that exhausted the day-scan bound.
    pub scan_ceiling_hits: Vec<TaskId>,
}

impl RunReport {
    pub fn get(&self, id: TaskId) -> Option<&PlacedTask> {
        self.placements.iter().find(|p| p.id == id)
    }

    pub fn placed_in(&self, phase: Phase) -> impl Iterator<Item = &PlacedTask> {
        self.placements.iter().filter(move |p| p.phase == phase)
    }

    pub fn overflow_ids(&self) -> Vec<TaskId> {
        self.placed_in(Phase::Overflow).map(|p| p.id).collect()
    }
}

/// Scheduling engine bound to one availability configuration and weight map.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    availability: AvailabilityConfig,
    weights: Weights,
    config: EngineConfig,
}

impl Scheduler {
    pub fn new(availability: AvailabilityConfig, weights: Weights) -> Self {
        Self {
            availability,
            weights,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn availability(&self) -> &AvailabilityConfig {
        &self.availability
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Run at the current local wall-clock time.
    pub fn run_now<S: TaskStore + ?Sized>(&self, store: &mut S) -> Result<RunReport> {
        self.run(store, Local::now().naive_local())
    }

    /// Re-plan every todo in `store` as of `now`.
    ///
    /// The `&mut` borrow makes the run the only user of `store` until it returns.
    ///
    /// # Errors
    /// Returns [`SlotError::InvalidTask`](crate::SlotError::InvalidTask) before touching the
    /// store if any todo lacks a positive estimate. Store errors abort the run with the
    /// placements committed so far left in place.
    pub fn run<S: TaskStore + ?Sized>(
        &self,
        store: &mut S,
        now: NaiveDateTime,
    ) -> Result<RunReport> {
        let mut todos = store.todo_tasks()?;
        for task in &todos {
            task.validate()?;
        }
        let ids: Vec<TaskId> = todos.iter().map(|t| t.id).collect();
        store.clear_placements(&ids)?;
        todos.iter_mut().for_each(Task::clear_placement);

        info!(%now, todos = todos.len(), "starting scheduling run");

        let mut ctx = RunContext::new(now, rank(todos, now, &self.weights));
        let queue = std::mem::take(&mut ctx.queue);
        for (task, score) in queue {
            match self.place_within_deadline(&*store, &mut ctx, &task)? {
                Some(iv) => ctx.commit(store, &task, iv, Phase::Deadline)?,
                None => {
                    debug!(id = task.id, score, "deferred to overflow");
                    ctx.overflow.push(task);
                }
            }
        }

        self.place_overflow(store, &mut ctx)?;

        let report = ctx.report;
        info!(
            placed = report.placed_in(Phase::Deadline).count(),
            overflow = report.placed_in(Phase::Overflow).count(),
            "scheduling run complete"
        );
        Ok(report)
    }

    /// Deadline phase for one task: the first acceptable slot, or `None` to defer it.
    fn place_within_deadline<S: TaskStore + ?Sized>(
        &self,
        store: &S,
        ctx: &mut RunContext,
        task: &Task,
    ) -> Result<Option<Interval>> {
        let now = ctx.now;
        if task.deadline.is_some_and(|d| d <= now) || self.availability.is_empty() {
            return Ok(None);
        }
        let minutes = task.estimate.unwrap_or_default();
        let today = now.date();

        for offset in 0..self.config.max_scan_days {
            let Some(date) = today.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            if task.deadline.is_some_and(|d| date > d.date()) {
                return Ok(None);
            }

            let mut windows = self.availability.windows_for_date(date);
            if offset == 0 {
                windows = windows
                    .into_iter()
                    .filter(|w| w.end > now)
                    .map(|w| Interval::new(w.start.max(now), w.end))
                    .collect();
            }
            if windows.is_empty() {
                continue;
            }

            let busy = ctx.busy_for(store, date)?;
            let slots = free_slots(&windows, busy);
            if let Some(iv) = find_first_fit(&slots, now, minutes, task.deadline) {
                return Ok(Some(iv));
            }
        }

        if task.deadline.is_none() {
            warn!(
                id = task.id,
                max_scan_days = self.config.max_scan_days,
                "no slot within the scan bound"
            );
            ctx.report.scan_ceiling_hits.push(task.id);
        }
        Ok(None)
    }

    /// Overflow phase: chain deferred tasks back to back from the end of today's last fixed
    /// event, or from `now` when today has none.
    fn place_overflow<S: TaskStore + ?Sized>(
        &self,
        store: &mut S,
        ctx: &mut RunContext,
    ) -> Result<()> {
        if ctx.overflow.is_empty() {
            return Ok(());
        }
        let events = event_intervals_for(&*store, ctx.now.date())?;
        let mut pointer = events.last().map_or(ctx.now, |last| last.end);

        for task in std::mem::take(&mut ctx.overflow) {
            let placement = Placement::starting_at(pointer, task.estimate.unwrap_or_default());
            ctx.commit(store, &task, placement.interval(), Phase::Overflow)?;
            pointer = placement.end_time;
        }
        Ok(())
    }
}

/// Mutable state of one run.
struct RunContext {
    now: NaiveDateTime,
    /// Rank-ordered tasks still to be tried in the deadline phase.
    queue: Vec<(Task, f64)>,
    /// Busy intervals per date, loaded from the store on first use and extended on commit.
    busy: HashMap<NaiveDate, Vec<Interval>>,
    /// Deferred tasks, in rank order.
    overflow: Vec<Task>,
    report: RunReport,
}

impl RunContext {
    fn new(now: NaiveDateTime, queue: Vec<(Task, f64)>) -> Self {
        Self {
            now,
            queue,
            busy: HashMap::new(),
            overflow: Vec::new(),
            report: RunReport {
                now,
                ..RunReport::default()
            },
        }
    }

    fn busy_for<S: TaskStore + ?Sized>(
        &mut self,
        store: &S,
        date: NaiveDate,
    ) -> Result<&[Interval]> {
        if !self.busy.contains_key(&date) {
            let loaded = busy_intervals_for(store, date)?;
            self.busy.insert(date, loaded);
        }
        Ok(self.busy.get(&date).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Persist a placement, then make it busy time for the rest of the run.
    fn commit<S: TaskStore + ?Sized>(
        &mut self,
        store: &mut S,
        task: &Task,
        iv: Interval,
        phase: Phase,
    ) -> Result<()> {
        store.set_placement(task.id, Placement::from(iv))?;
        debug!(id = task.id, ?phase, start = %iv.start, end = %iv.end, "placed task");

        for (date, cached) in self.busy.iter_mut() {
            if let Some(clipped) = iv.clip(&day_bounds(*date)) {
                let at = cached.partition_point(|b| b.start <= clipped.start);
                cached.insert(at, clipped);
            }
        }

        self.report.placements.push(PlacedTask {
            id: task.id,
            phase,
            start: iv.start,
            end: iv.end,
        });
        Ok(())
    }
}

/// Run the engine once over `store`. `now` defaults to the current local time.
pub fn slot_tasks<S: TaskStore + ?Sized>(
    store: &mut S,
    availability: &AvailabilityConfig,
    weights: &Weights,
    now: Option<NaiveDateTime>,
) -> Result<RunReport> {
    let scheduler = Scheduler::new(availability.clone(), weights.clone());
    match now {
        Some(now) => scheduler.run(store, now),
        None => scheduler.run_now(store),
    }
}
