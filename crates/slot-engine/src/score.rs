//! Priority scoring and ranking of pending tasks.
//!
//! A task's score is the sum of:
//!
//! - `priority × weights["priority"]`
//! - `weights["deadline"] / minutes_until_deadline`, with the minutes floored at 1 so an
//!   overdue or imminent deadline yields the largest urgency instead of dividing by zero
//! - `attribute × weights[k]` for every other key `k` the task exposes as a number
//!
//! Missing weights count as 0, not 1. Higher scores rank first.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::task::Task;

pub const PRIORITY_KEY: &str = "priority";
pub const DEADLINE_KEY: &str = "deadline";

/// Factor name → weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(BTreeMap<String, f64>);

impl Weights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, factor: impl Into<String>, weight: f64) -> Self {
        self.0.insert(factor.into(), weight);
        self
    }

    /// The weight for `factor`, 0 when absent.
    pub fn get(&self, factor: &str) -> f64 {
        self.0.get(factor).copied().unwrap_or(0.0)
    }

    /// Weights other than the two reserved keys.
    pub fn extra_factors(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0
            .iter()
            .filter(|(k, _)| k.as_str() != PRIORITY_KEY && k.as_str() != DEADLINE_KEY)
            .map(|(k, w)| (k.as_str(), *w))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Weights {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, w)| (k.into(), w)).collect())
    }
}

/// Score one task at `now`.
pub fn score(task: &Task, now: NaiveDateTime, weights: &Weights) -> f64 {
    let base = f64::from(task.priority) * weights.get(PRIORITY_KEY);

    let urgency = task.deadline.map_or(0.0, |deadline| {
        let minutes = ((deadline - now).num_seconds() as f64 / 60.0).max(1.0);
        weights.get(DEADLINE_KEY) / minutes
    });

    let extra: f64 = weights
        .extra_factors()
        .filter_map(|(factor, weight)| task.numeric_attribute(factor).map(|v| v * weight))
        .sum();

    base + urgency + extra
}

/// Descending score, ties broken by ascending task id.
fn by_rank(a: &(Task, f64), b: &(Task, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id))
}

/// Score every task at the same `now` and order them for placement.
pub fn rank(tasks: Vec<Task>, now: NaiveDateTime, weights: &Weights) -> Vec<(Task, f64)> {
    let mut scored: Vec<(Task, f64)> = tasks
        .into_iter()
        .map(|t| {
            let s = score(&t, now, weights);
            (t, s)
        })
        .collect();
    scored.sort_by(by_rank);
    scored
}
