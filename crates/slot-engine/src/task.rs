//! Task records as read from and written to the task store.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SlotError};
use crate::interval::Interval;

/// Opaque, stable task identifier assigned by the store.
pub type TaskId = u64;

/// Whether a task is a fixed commitment or schedulable work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Fixed, externally caused. Never moved by the engine.
    Event,
    /// Pending work the engine places.
    Todo,
}

/// A single task.
///
/// For `Todo` tasks the engine owns `scheduled_for`, `start_time` and `end_time`; for `Event`
/// tasks those fields are caller-supplied and read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(default)]
    pub priority: u32,
    /// Expected work in minutes. Required for `Todo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDateTime>,
    #[serde(default)]
    pub scheduled_for: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    /// Event length in minutes; derived from `start_time`/`end_time` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    /// Identifier of the mirrored event in an external calendar, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Any further fields. Numeric entries are usable as scoring factors.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The engine-owned scheduling triple of a `Todo` task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub scheduled_for: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl Placement {
    /// Place a task of `estimate_minutes` starting at `start`.
    pub fn starting_at(start: NaiveDateTime, estimate_minutes: u32) -> Self {
        Self {
            scheduled_for: start.date(),
            start_time: start,
            end_time: start + Duration::minutes(i64::from(estimate_minutes)),
        }
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start_time, self.end_time)
    }
}

impl From<Interval> for Placement {
    fn from(iv: Interval) -> Self {
        Self {
            scheduled_for: iv.start.date(),
            start_time: iv.start,
            end_time: iv.end,
        }
    }
}

impl Task {
    pub fn todo(id: TaskId, title: impl Into<String>, estimate_minutes: u32) -> Self {
        Self::blank(id, title.into(), TaskKind::Todo).with_estimate(estimate_minutes)
    }

    pub fn event(
        id: TaskId,
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        let mut task = Self::blank(id, title.into(), TaskKind::Event);
        task.start_time = Some(start);
        task.end_time = Some(end);
        task.derive_duration();
        task
    }

    fn blank(id: TaskId, title: String, kind: TaskKind) -> Self {
        Self {
            id,
            title,
            description: None,
            kind,
            priority: 0,
            estimate: None,
            deadline: None,
            scheduled_for: None,
            start_time: None,
            end_time: None,
            duration: None,
            category_id: None,
            external_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimate = Some(minutes);
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDateTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach an extra attribute (numeric values take part in scoring).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_todo(&self) -> bool {
        self.kind == TaskKind::Todo
    }

    pub fn is_event(&self) -> bool {
        self.kind == TaskKind::Event
    }

    /// The placed interval, when both ends are set.
    pub fn interval(&self) -> Option<Interval> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(Interval::new(start, end)),
            _ => None,
        }
    }

    pub fn placement(&self) -> Option<Placement> {
        Some(Placement {
            scheduled_for: self.scheduled_for?,
            start_time: self.start_time?,
            end_time: self.end_time?,
        })
    }

    pub fn apply_placement(&mut self, placement: Placement) {
        self.scheduled_for = Some(placement.scheduled_for);
        self.start_time = Some(placement.start_time);
        self.end_time = Some(placement.end_time);
    }

    pub fn clear_placement(&mut self) {
        self.scheduled_for = None;
        self.start_time = None;
        self.end_time = None;
    }

    /// Resolve a numeric attribute by name for extensible scoring factors.
    ///
    /// Built-in numeric fields are consulted first, then `extra`. Non-numeric values and
    /// missing names yield `None`.
    pub fn numeric_attribute(&self, name: &str) -> Option<f64> {
        match name {
            "id" => Some(self.id as f64),
            "priority" => Some(f64::from(self.priority)),
            "estimate" => self.estimate.map(f64::from),
            "duration" => self.duration.map(f64::from),
            "category_id" => self.category_id.map(|c| c as f64),
            _ => self.extra.get(name).and_then(Value::as_f64),
        }
    }

    /// Fill `duration` from the placed interval of an event when missing.
    pub fn derive_duration(&mut self) {
        if self.is_event() && self.duration.is_none() {
            if let Some(iv) = self.interval() {
                self.duration = u32::try_from(iv.duration_minutes()).ok();
            }
        }
    }

    /// Input validation for tasks entering the store.
    ///
    /// Events need both ends with `end > start` and, if given, a matching `duration`.
    /// Todos need a positive `estimate`.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| SlotError::InvalidTask {
            id: self.id,
            reason: reason.to_string(),
        };
        match self.kind {
            TaskKind::Event => {
                let iv = self
                    .interval()
                    .ok_or_else(|| invalid("event tasks must have both start_time and end_time"))?;
                if iv.is_empty() {
                    return Err(invalid("end_time must be after start_time"));
                }
                if let Some(duration) = self.duration {
                    if i64::from(duration) != iv.duration_minutes() {
                        return Err(invalid("duration must match end_time - start_time"));
                    }
                }
            }
            TaskKind::Todo => match self.estimate {
                None => return Err(invalid("todo tasks must have an estimate")),
                Some(0) => return Err(invalid("estimate must be positive")),
                Some(_) => {}
            },
        }
        Ok(())
    }
}
