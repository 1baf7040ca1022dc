//! Authenticated session: owns the credential, the controller and the draft.

use std::fmt;

use time::OffsetDateTime;
use tracing::{debug, info, warn};
use vibe_tasks_core::id::TaskId;
use vibe_tasks_core::{NewTask, Task, TaskPatch};

use crate::config::CategoryConfig;
use crate::draft::DraftEditor;
use crate::error::SyncResult;
use crate::sync::SyncController;
use crate::task_store::RemoteTaskStore;
use crate::transfer::ImportSummary;

/// Bearer credential presented to the remote store.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for transports.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Explicitly owned client session.
///
/// Created by [`login`](Self::login) and torn down on [`logout`](Self::logout)
/// or when any observed call reports an unauthorized response. Teardown
/// clears the cache, discards the draft and withdraws the credential.
pub struct Session<S: RemoteTaskStore> {
    credential: Option<Credential>,
    controller: SyncController<S>,
    draft: DraftEditor,
}

impl<S: RemoteTaskStore> Session<S> {
    /// Present `credential` to `store` and load the collection.
    ///
    /// # Errors
    /// Returns the failure of the first refresh; the credential is withdrawn then.
    pub async fn login(store: S, categories: CategoryConfig, credential: Credential) -> SyncResult<Self> {
        store.set_credential(Some(&credential));
        let mut session = Self {
            credential: Some(credential),
            controller: SyncController::new(store, categories),
            draft: DraftEditor::Idle,
        };
        if let Err(err) = session.controller.refresh().await {
            session.teardown().await;
            return Err(err);
        }
        info!(count = session.controller.cache().await.len(), "Session started");
        Ok(session)
    }

    /// Returns true until the session is torn down.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.credential.is_some()
    }

    /// Engine bound to this session.
    #[must_use]
    pub const fn controller(&self) -> &SyncController<S> {
        &self.controller
    }

    /// Current edit state.
    #[must_use]
    pub const fn draft(&self) -> &DraftEditor {
        &self.draft
    }

    /// Mutable edit state, for `start`/`update_field`/`cancel`.
    pub const fn draft_mut(&mut self) -> &mut DraftEditor {
        &mut self.draft
    }

    /// Inspect the outcome of a call made through [`controller`](Self::controller),
    /// tearing the session down if it was rejected as unauthorized.
    ///
    /// # Errors
    /// Returns `result` unchanged.
    pub async fn observe<T>(&mut self, result: SyncResult<T>) -> SyncResult<T> {
        if let Err(err) = &result
            && err.is_unauthorized()
        {
            warn!("Credential rejected by the remote store");
            self.teardown().await;
        }
        result
    }

    /// End the session.
    pub async fn logout(&mut self) {
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        self.controller.clear().await;
        self.draft.cancel();
        self.credential = None;
        self.controller.store().set_credential(None);
        info!("Session torn down");
    }

    async fn settle<T>(&mut self, result: SyncResult<T>) -> SyncResult<T> {
        let result = self.observe(result).await;
        if result.is_ok() {
            let cache = self.controller.cache().await;
            self.draft.reconcile(&cache);
        }
        result
    }

    /// Reload the collection.
    ///
    /// # Errors
    /// Same as [`SyncController::refresh`].
    pub async fn refresh(&mut self) -> SyncResult<usize> {
        let result = self.controller.refresh().await;
        self.settle(result).await
    }

    /// Create a task.
    ///
    /// # Errors
    /// Same as [`SyncController::create`].
    pub async fn create(&mut self, new_task: &NewTask) -> SyncResult<Task> {
        let result = self.controller.create(new_task).await;
        self.settle(result).await
    }

    /// Apply `patch` to a task. A draft of that task is discarded once the
    /// update succeeds, since it no longer matches the stored fields.
    ///
    /// # Errors
    /// Same as [`SyncController::update`].
    pub async fn update(&mut self, id: TaskId, patch: &TaskPatch) -> SyncResult<Option<Task>> {
        let result = self.controller.update(id, patch).await;
        if result.is_ok() && self.draft.editing_task() == Some(id) {
            debug!(task = %id, "Dropped draft of a task updated elsewhere");
            self.draft.cancel();
        }
        self.settle(result).await
    }

    /// Flip a task's completion flag.
    ///
    /// # Errors
    /// Same as [`SyncController::toggle`].
    pub async fn toggle(&mut self, id: TaskId, current_done: bool) -> SyncResult<Option<Task>> {
        let result = self.controller.toggle(id, current_done).await;
        self.settle(result).await
    }

    /// Delete a task, dropping its draft if it was being edited.
    ///
    /// # Errors
    /// Same as [`SyncController::remove`].
    pub async fn remove(&mut self, id: TaskId) -> SyncResult<()> {
        let result = self.controller.remove(id).await;
        self.settle(result).await
    }

    /// Move a task within the displayed sequence.
    ///
    /// # Errors
    /// Same as [`SyncController::move_task`].
    pub async fn move_task(&mut self, displayed: &[Task], old_index: usize, new_index: usize) -> SyncResult<bool> {
        let result = self.controller.move_task(displayed, old_index, new_index).await;
        self.settle(result).await
    }

    /// Import tasks from a JSON document.
    ///
    /// # Errors
    /// Same as [`SyncController::import_json`].
    pub async fn import_json(&mut self, raw: &str) -> SyncResult<ImportSummary> {
        let result = self.controller.import_json(raw).await;
        self.settle(result).await
    }

    /// Commit the active draft.
    ///
    /// # Errors
    /// Same as [`DraftEditor::commit`].
    pub async fn commit_draft(&mut self) -> SyncResult<Option<Task>> {
        let result = self.draft.commit(&self.controller).await;
        self.settle(result).await
    }

    /// Time of the last successful refresh.
    pub async fn last_refresh(&self) -> Option<OffsetDateTime> {
        self.controller.last_refresh().await
    }
}
