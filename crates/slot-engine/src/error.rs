//! Error types for slot-engine operations.

use chrono::NaiveTime;
use thiserror::Error;

use crate::task::TaskId;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid availability window on weekday {weekday}: {start} is not before {end}")]
    InvalidWindow {
        weekday: u8,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("Invalid weekday index: {0} (expected 0=Monday..6=Sunday)")]
    InvalidWeekday(u8),

    #[error("Invalid task {id}: {reason}")]
    InvalidTask { id: TaskId, reason: String },

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Store error: {0}")]
    Store(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SlotError>;
