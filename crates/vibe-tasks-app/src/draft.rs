//! Exclusive inline-edit draft over a single task.

use tracing::debug;
use vibe_tasks_core::id::TaskId;
use vibe_tasks_core::{Priority, Task, TaskPatch};

use crate::error::{SyncResult, ValidationError};
use crate::sync::SyncController;
use crate::task_cache::TaskCache;
use crate::task_store::RemoteTaskStore;

/// Working copy of the editable fields of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Task being edited.
    pub task_id: TaskId,
    /// Edited content.
    pub content: String,
    /// Edited category.
    pub category: String,
    /// Edited priority.
    pub priority: Priority,
}

impl Draft {
    /// Snapshot the editable fields of `task`.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id,
            content: task.content.clone(),
            category: task.category.clone(),
            priority: task.priority,
        }
    }

    fn into_patch(self) -> TaskPatch {
        TaskPatch {
            content: Some(self.content),
            category: Some(self.category),
            priority: Some(self.priority),
            ..TaskPatch::default()
        }
    }
}

/// Single-field change applied to the active draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    /// Replace the content.
    Content(String),
    /// Replace the category.
    Category(String),
    /// Replace the priority.
    Priority(Priority),
}

/// Edit state machine: at most one draft exists at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DraftEditor {
    /// No edit in progress.
    #[default]
    Idle,
    /// Editing the task named by the draft.
    Editing(Draft),
}

impl DraftEditor {
    /// Begin editing `task`, discarding any previous draft.
    pub fn start(&mut self, task: &Task) {
        if let Self::Editing(previous) = self {
            debug!(task = %previous.task_id, "Discarded draft in favour of a new edit");
        }
        *self = Self::Editing(Draft::from_task(task));
    }

    /// Change one field of the draft. Returns `false` when nothing is being edited.
    pub fn update_field(&mut self, field: DraftField) -> bool {
        let Self::Editing(draft) = self else {
            return false;
        };
        match field {
            DraftField::Content(content) => draft.content = content,
            DraftField::Category(category) => draft.category = category,
            DraftField::Priority(priority) => draft.priority = priority,
        }
        true
    }

    /// Discard the draft without touching the store.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Send the draft as an update and return to [`DraftEditor::Idle`].
    ///
    /// Committing while idle does nothing and yields `Ok(None)`. A draft with
    /// blank content is rejected and stays active. Otherwise the editor is idle
    /// once the update settles, whether it succeeded or not; a commit that is
    /// dropped before settling leaves the draft in place.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyContent`] for blank content, or the
    /// failure of [`SyncController::update`].
    pub async fn commit<S: RemoteTaskStore>(
        &mut self,
        controller: &SyncController<S>,
    ) -> SyncResult<Option<Task>> {
        let Self::Editing(draft) = self else {
            return Ok(None);
        };
        if draft.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        let id = draft.task_id;
        let patch = draft.clone().into_patch();
        debug!(task = %id, "Committing draft");
        let result = controller.update(id, &patch).await;
        *self = Self::Idle;
        result
    }

    /// Active draft, if any.
    #[must_use]
    pub const fn draft(&self) -> Option<&Draft> {
        match self {
            Self::Idle => None,
            Self::Editing(draft) => Some(draft),
        }
    }

    /// Returns true while a draft is active.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }

    /// Id of the task being edited.
    #[must_use]
    pub const fn editing_task(&self) -> Option<TaskId> {
        match self {
            Self::Idle => None,
            Self::Editing(draft) => Some(draft.task_id),
        }
    }

    /// Drop the draft when its task is gone from `cache`. Returns true if it was dropped.
    pub fn reconcile(&mut self, cache: &TaskCache) -> bool {
        match self.editing_task() {
            Some(id) if !cache.contains(id) => {
                debug!(task = %id, "Dropped draft of a task that no longer exists");
                self.cancel();
                true
            }
            _ => false,
        }
    }
}
