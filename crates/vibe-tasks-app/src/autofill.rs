//! Prefill new tasks from free text through a [`TextAnalyzer`].

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};
use vibe_tasks_core::{NewTask, Priority, Task};

use crate::error::{RemoteError, SyncResult, ValidationError};
use crate::sync::SyncController;
use crate::task_store::{RemoteTaskStore, TextAnalyzer};

/// Result of analyzing a free-text prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// Suggested task text.
    pub title: String,
    /// Suggested urgency.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Longer explanation; never inspected by the engine.
    #[serde(default)]
    pub description: Option<String>,
    /// Suggested due date; an unreadable date is dropped, not fatal.
    #[serde(default, alias = "due_date", with = "crate::filter_util::lenient_deadline")]
    pub deadline: Option<OffsetDateTime>,
}

/// Editable new-task form, possibly prefilled by an analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTaskDraft {
    /// Task text.
    pub content: String,
    /// Chosen category; `None` lets the store decide.
    pub category: Option<String>,
    /// Chosen urgency.
    pub priority: Priority,
    /// Chosen due date.
    pub deadline: Option<OffsetDateTime>,
}

impl NewTaskDraft {
    /// Build the create payload for this form.
    #[must_use]
    pub fn to_new_task(&self) -> NewTask {
        NewTask {
            content: self.content.clone(),
            category: self.category.clone(),
            priority: Some(self.priority),
            deadline: self.deadline,
        }
    }
}

impl From<Analysis> for NewTaskDraft {
    fn from(analysis: Analysis) -> Self {
        Self {
            content: analysis.title,
            category: None,
            priority: analysis.priority.unwrap_or_default(),
            deadline: analysis.deadline,
        }
    }
}

/// New-task composer: holds the free-text prompt and the form being filled.
#[derive(Debug)]
pub struct TaskComposer<A> {
    analyzer: A,
    prompt: String,
    draft: NewTaskDraft,
}

impl<A: TextAnalyzer> TaskComposer<A> {
    /// Create an empty composer.
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            prompt: String::new(),
            draft: NewTaskDraft::default(),
        }
    }

    /// Replace the free-text prompt.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Current prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Current form contents.
    #[must_use]
    pub const fn draft(&self) -> &NewTaskDraft {
        &self.draft
    }

    /// Mutable access to the form, for manual edits.
    pub const fn draft_mut(&mut self) -> &mut NewTaskDraft {
        &mut self.draft
    }

    /// Analyze the prompt and prefill the form from the result.
    ///
    /// The prompt is cleared on success and kept on failure.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyPrompt`] for a blank prompt (the analyzer
    /// is not called), or the analyzer's error.
    pub async fn analyze(&mut self) -> SyncResult<&NewTaskDraft> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt.into());
        }
        let analysis = self.analyzer.analyze(prompt).await.map_err(|err| {
            let err: RemoteError = err.into();
            warn!(error = %err, "Text analysis failed");
            err
        })?;
        debug!(priority = ?analysis.priority, "Prefilled task from analysis");
        self.draft = analysis.into();
        self.prompt.clear();
        Ok(&self.draft)
    }

    /// Create the task described by the form, resetting the form on success.
    ///
    /// # Errors
    /// Propagates [`SyncController::create`] failures; the form is kept then.
    pub async fn submit<S: RemoteTaskStore>(
        &mut self,
        controller: &SyncController<S>,
    ) -> SyncResult<Task> {
        let task = controller.create(&self.draft.to_new_task()).await?;
        self.draft = NewTaskDraft::default();
        Ok(task)
    }
}
