//! JSON-file task store.
//!
//! The whole task list lives in one JSON array. Every mutation rewrites the file before
//! returning, so a run that aborts midway leaves exactly the placements committed so far.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use slot_engine::{MemoryStore, Placement, Task, TaskId, TaskStore};

pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Load and validate the task file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let mut tasks: Vec<Task> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse tasks from: {}", path.display()))?;

        let mut seen = HashSet::new();
        for task in &mut tasks {
            if !seen.insert(task.id) {
                bail!("Duplicate task id {} in {}", task.id, path.display());
            }
            task.derive_duration();
            task.validate()?;
        }

        Ok(Self {
            path,
            inner: MemoryStore::new(tasks),
        })
    }

    pub fn tasks(&self) -> &[Task] {
        self.inner.tasks()
    }

    /// Write the task list to a sibling temp file, then rename it over the original.
    fn flush(&self) -> slot_engine::Result<()> {
        let json = serde_json::to_string_pretty(self.inner.tasks())?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TaskStore for FileStore {
    fn todo_tasks(&self) -> slot_engine::Result<Vec<Task>> {
        self.inner.todo_tasks()
    }

    fn tasks_intersecting(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> slot_engine::Result<Vec<Task>> {
        self.inner.tasks_intersecting(start, end)
    }

    fn events_intersecting(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> slot_engine::Result<Vec<Task>> {
        self.inner.events_intersecting(start, end)
    }

    fn set_placement(&mut self, id: TaskId, placement: Placement) -> slot_engine::Result<()> {
        self.inner.set_placement(id, placement)?;
        self.flush()
    }

    fn clear_placements(&mut self, ids: &[TaskId]) -> slot_engine::Result<()> {
        self.inner.clear_placements(ids)?;
        self.flush()
    }
}
