//! Local snapshot of the remote task collection.

use std::collections::HashMap;

use time::OffsetDateTime;
use vibe_tasks_core::id::TaskId;
use vibe_tasks_core::{FilterCriteria, Task};

/// Ordered, indexed view of the tasks last returned by the store.
///
/// A cache is only ever built from a complete listing; it is never patched
/// in place.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskCache {
    tasks: Vec<Task>,
    task_index: HashMap<TaskId, usize>,
}

impl TaskCache {
    /// Build a cache from a full listing, sorted into display order.
    #[must_use]
    pub fn from_tasks(mut tasks: Vec<Task>) -> Self {
        tasks.sort_by(Task::display_cmp);
        let task_index = tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| (task.id, idx))
            .collect();
        Self { tasks, task_index }
    }

    /// Every task in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of cached tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look a task up by id.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.task_index.get(&id).and_then(|&idx| self.tasks.get(idx))
    }

    /// Returns true when the id is present.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.task_index.contains_key(&id)
    }

    /// Lazily iterate over the tasks matching `criteria`, in display order.
    pub fn filtered<'a>(
        &'a self,
        criteria: &'a FilterCriteria,
        now: OffsetDateTime,
    ) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks
            .iter()
            .filter(move |task| criteria.matches(task, now))
    }

    /// Collect the tasks matching `criteria`, in display order.
    #[must_use]
    pub fn filtered_tasks(&self, criteria: &FilterCriteria, now: OffsetDateTime) -> Vec<Task> {
        self.filtered(criteria, now).cloned().collect()
    }
}
