//! Detect overlapping placed tasks.
//!
//! Compares every pair of placed tasks. Adjacent tasks (one ends exactly when the other
//! starts) are NOT conflicts.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId};

/// Two placed tasks whose intervals overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub task_a: TaskId,
    pub task_b: TaskId,
    pub overlap_minutes: i64,
}

/// Find all pairwise overlaps among the placed tasks in `tasks`.
///
/// Tasks without both `start_time` and `end_time` are ignored. Each pair is reported once,
/// with `task_a` earlier in the input than `task_b`.
pub fn find_conflicts(tasks: &[Task]) -> Vec<Conflict> {
    let placed: Vec<_> = tasks
        .iter()
        .filter_map(|t| t.interval().map(|iv| (t.id, iv)))
        .collect();

    let mut conflicts = Vec::new();
    for (i, (id_a, a)) in placed.iter().enumerate() {
        for (id_b, b) in &placed[i + 1..] {
            if a.overlaps(b) {
                let overlap_start = a.start.max(b.start);
                let overlap_end = a.end.min(b.end);
                conflicts.push(Conflict {
                    task_a: *id_a,
                    task_b: *id_b,
                    overlap_minutes: (overlap_end - overlap_start).num_minutes(),
                });
            }
        }
    }

    conflicts
}
