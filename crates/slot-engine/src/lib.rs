//! # slot-engine
//!
//! Greedy placement of pending TODO tasks into recurring weekly availability.
//!
//! Given weekday availability windows, already committed time (fixed events and earlier
//! placements) and per-task priorities and deadlines, the engine assigns every TODO a
//! concrete start and end. Tasks that cannot finish inside a window before their deadline
//! fall back to a back-to-back overflow chain, so every run places every task.
//!
//! ## Modules
//!
//! - [`interval`] — `Interval` and the merge that canonicalizes interval sets
//! - [`availability`] — weekday availability and its projection onto dates
//! - [`busy`] — busy intervals for a date, clipped to the day
//! - [`freebusy`] — subtract busy time from availability windows
//! - [`score`] — multi-factor priority score and ranking
//! - [`engine`] — the two-phase scheduling run
//! - [`store`] — the task store contract and an in-memory store
//! - [`task`] — task records
//! - [`conflict`] — detect overlapping placements
//! - [`error`] — Error types

pub mod availability;
pub mod busy;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod freebusy;
pub mod interval;
pub mod score;
pub mod store;
pub mod task;

pub use availability::{AvailabilityConfig, TimeWindow};
pub use busy::{busy_intervals_for, day_bounds};
pub use conflict::find_conflicts;
pub use engine::{slot_tasks, EngineConfig, Phase, PlacedTask, RunReport, Scheduler};
pub use error::{Result, SlotError};
pub use freebusy::free_slots;
pub use interval::{merge_intervals, Interval};
pub use score::{score, Weights};
pub use store::{MemoryStore, TaskStore};
pub use task::{Placement, Task, TaskId, TaskKind};
