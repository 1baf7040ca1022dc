//! Contracts of the remote collaborators the engine talks to.

use std::sync::Arc;

use vibe_tasks_core::id::TaskId;
use vibe_tasks_core::{NewTask, SortEntry, Task, TaskPatch};
use vibe_tasks_store_local::{LocalStore, LocalStoreError};

use crate::autofill::Analysis;
use crate::error::RemoteError;
use crate::session::Credential;
use crate::transfer::{ImportSummary, TaskExport};

/// Remote persistence service for the task collection.
///
/// Implementations own transport concerns (retries, timeouts, wire format);
/// the engine only relies on this contract.
#[allow(async_fn_in_trait)]
pub trait RemoteTaskStore: Send + Sync {
    /// Error type bubbled up from the backing store.
    type Error: Into<RemoteError> + Send;

    /// Fetch the full collection.
    ///
    /// # Errors
    /// Returns a store-specific error when the read fails.
    async fn list(&self) -> Result<Vec<Task>, Self::Error>;

    /// Create a task; the store assigns its id and `sort_order`.
    ///
    /// # Errors
    /// Returns a store-specific error when the task cannot be created.
    async fn create(&self, task: &NewTask) -> Result<Task, Self::Error>;

    /// Apply a partial update. Stores may or may not echo the updated task.
    ///
    /// # Errors
    /// Returns a store-specific error, including not-found for stale ids.
    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, Self::Error>;

    /// Delete a task.
    ///
    /// # Errors
    /// Returns a store-specific error, including not-found for stale ids.
    async fn remove(&self, id: TaskId) -> Result<(), Self::Error>;

    /// Persist a batch of sort orders in one call.
    ///
    /// # Errors
    /// Returns a store-specific error when the batch is rejected.
    async fn reorder(&self, entries: &[SortEntry]) -> Result<(), Self::Error>;

    /// Export the full collection.
    ///
    /// # Errors
    /// Returns a store-specific error when the read fails.
    async fn export(&self) -> Result<TaskExport, Self::Error>;

    /// Import a batch of tasks.
    ///
    /// # Errors
    /// Returns a store-specific error when the batch is rejected.
    async fn import(&self, tasks: &[Task]) -> Result<ImportSummary, Self::Error>;

    /// Present (or withdraw, with `None`) the bearer credential for later calls.
    ///
    /// The default implementation does nothing, as not all stores authenticate.
    fn set_credential(&self, _credential: Option<&Credential>) {}
}

/// Opaque free-text analysis service used to prefill new tasks.
#[allow(async_fn_in_trait)]
pub trait TextAnalyzer: Send + Sync {
    /// Error type bubbled up from the analyzer.
    type Error: Into<RemoteError> + Send;

    /// Extract a task title and priority from free text.
    ///
    /// # Errors
    /// Returns an analyzer-specific error when the request fails.
    async fn analyze(&self, text: &str) -> Result<Analysis, Self::Error>;
}

impl<S: RemoteTaskStore> RemoteTaskStore for Arc<S> {
    type Error = S::Error;

    async fn list(&self) -> Result<Vec<Task>, Self::Error> {
        (**self).list().await
    }

    async fn create(&self, task: &NewTask) -> Result<Task, Self::Error> {
        (**self).create(task).await
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, Self::Error> {
        (**self).update(id, patch).await
    }

    async fn remove(&self, id: TaskId) -> Result<(), Self::Error> {
        (**self).remove(id).await
    }

    async fn reorder(&self, entries: &[SortEntry]) -> Result<(), Self::Error> {
        (**self).reorder(entries).await
    }

    async fn export(&self) -> Result<TaskExport, Self::Error> {
        (**self).export().await
    }

    async fn import(&self, tasks: &[Task]) -> Result<ImportSummary, Self::Error> {
        (**self).import(tasks).await
    }

    fn set_credential(&self, credential: Option<&Credential>) {
        (**self).set_credential(credential);
    }
}

impl From<LocalStoreError> for RemoteError {
    fn from(err: LocalStoreError) -> Self {
        match err {
            LocalStoreError::TaskNotFound(id) => Self::NotFound(id),
            LocalStoreError::Unauthorized => Self::Unauthorized,
            other => Self::Transport(other.to_string()),
        }
    }
}

impl RemoteTaskStore for LocalStore {
    type Error = LocalStoreError;

    async fn list(&self) -> Result<Vec<Task>, Self::Error> {
        Self::list(self).await
    }

    async fn create(&self, task: &NewTask) -> Result<Task, Self::Error> {
        Self::create(self, task).await
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, Self::Error> {
        Self::update(self, id, patch).await.map(Some)
    }

    async fn remove(&self, id: TaskId) -> Result<(), Self::Error> {
        Self::remove(self, id).await
    }

    async fn reorder(&self, entries: &[SortEntry]) -> Result<(), Self::Error> {
        Self::reorder(self, entries).await
    }

    async fn export(&self) -> Result<TaskExport, Self::Error> {
        Self::export(self).await.map(|tasks| TaskExport { tasks })
    }

    async fn import(&self, tasks: &[Task]) -> Result<ImportSummary, Self::Error> {
        let imported_count = Self::import(self, tasks).await?;
        Ok(ImportSummary {
            message: format!("成功导入 {imported_count} 个任务"),
            imported_count,
        })
    }

    fn set_credential(&self, credential: Option<&Credential>) {
        Self::set_credential(self, credential.map(Credential::expose));
    }
}
