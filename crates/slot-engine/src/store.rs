//! The task store contract the engine runs against, plus an in-memory implementation.
//!
//! The engine never touches storage directly. Every read goes through the three queries of
//! [`TaskStore`] and every write through its two mutations, each of which must be durable
//! by the time it returns.

use chrono::NaiveDateTime;

use crate::error::{Result, SlotError};
use crate::task::{Placement, Task, TaskId};

/// Query/mutation surface of the backing task store.
pub trait TaskStore {
    /// All `Todo` tasks, in store order.
    fn todo_tasks(&self) -> Result<Vec<Task>>;

    /// Tasks of either kind whose placed interval intersects `[start, end)`.
    fn tasks_intersecting(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Task>>;

    /// `Event` tasks whose placed interval intersects `[start, end)`.
    fn events_intersecting(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Task>>;

    /// Write the scheduling triple of one task and commit.
    fn set_placement(&mut self, id: TaskId, placement: Placement) -> Result<()>;

    /// Clear the scheduling triple of every listed task and commit.
    fn clear_placements(&mut self, ids: &[TaskId]) -> Result<()>;
}

/// A [`TaskStore`] over a plain vector. Commits are immediate.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: Vec<Task>,
}

impl MemoryStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn insert(&mut self, task: Task) {
        self.tasks.push(task);
    }

    fn get_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(SlotError::TaskNotFound(id))
    }

    fn intersecting<'a>(
        &'a self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |t| {
            t.interval()
                .is_some_and(|iv| iv.start < end && iv.end > start)
        })
    }
}

impl TaskStore for MemoryStore {
    fn todo_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.iter().filter(|t| t.is_todo()).cloned().collect())
    }

    fn tasks_intersecting(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Task>> {
        Ok(self.intersecting(start, end).cloned().collect())
    }

    fn events_intersecting(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Task>> {
        Ok(self
            .intersecting(start, end)
            .filter(|t| t.is_event())
            .cloned()
            .collect())
    }

    fn set_placement(&mut self, id: TaskId, placement: Placement) -> Result<()> {
        self.get_mut(id)?.apply_placement(placement);
        Ok(())
    }

    fn clear_placements(&mut self, ids: &[TaskId]) -> Result<()> {
        // Resolve every id first so a bad batch leaves the store untouched.
        if let Some(&missing) = ids.iter().find(|&&id| self.get(id).is_none()) {
            return Err(SlotError::TaskNotFound(missing));
        }
        for t in self.tasks.iter_mut().filter(|t| ids.contains(&t.id)) {
            t.clear_placement();
        }
        Ok(())
    }
}

impl From<Vec<Task>> for MemoryStore {
    fn from(tasks: Vec<Task>) -> Self {
        Self::new(tasks)
    }
}
