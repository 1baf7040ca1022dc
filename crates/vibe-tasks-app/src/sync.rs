//! Sync controller: every mutation goes to the remote store, then the whole
//! cache is replaced from a fresh listing.

use std::sync::atomic::{AtomicUsize, Ordering};

use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use vibe_tasks_core::id::TaskId;
use vibe_tasks_core::{FilterCriteria, NewTask, SortEntry, Task, TaskPatch};

use crate::config::CategoryConfig;
use crate::error::{RemoteError, SyncError, SyncResult, ValidationError};
use crate::reorder::plan_move;
use crate::task_cache::TaskCache;
use crate::task_store::RemoteTaskStore;
use crate::transfer::{ImportSummary, TaskExport, parse_import_document};

struct CacheState {
    cache: TaskCache,
    last_refresh: Option<OffsetDateTime>,
}

/// Marks a remote call as in flight until dropped.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn remote_failure<E: Into<RemoteError>>(operation: &'static str, err: E) -> SyncError {
    let err = err.into();
    warn!(operation, error = %err, "Remote call failed");
    SyncError::Remote(err)
}

/// Orchestrates mutations against a [`RemoteTaskStore`] and owns the [`TaskCache`].
///
/// The controller is the only writer of the cache. Each successful mutation
/// is followed by a full [`refresh`](Self::refresh); a failed call leaves the
/// cache as it was. Overlapping calls are not sequenced: when two mutations
/// race, the cache reflects whichever listing arrives last.
pub struct SyncController<S> {
    store: S,
    categories: CategoryConfig,
    state: RwLock<CacheState>,
    in_flight: AtomicUsize,
}

impl<S: RemoteTaskStore> SyncController<S> {
    /// Create a controller with an empty cache.
    #[must_use]
    pub fn new(store: S, categories: CategoryConfig) -> Self {
        Self {
            store,
            categories,
            state: RwLock::new(CacheState {
                cache: TaskCache::default(),
                last_refresh: None,
            }),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Category label set used for validation.
    #[must_use]
    pub const fn categories(&self) -> &CategoryConfig {
        &self.categories
    }

    /// Returns true while a remote call or refetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Replace the cache wholesale with a fresh listing.
    ///
    /// # Errors
    /// Returns [`SyncError::Remote`] if the listing fails; the cache is kept then.
    pub async fn refresh(&self) -> SyncResult<usize> {
        let _loading = LoadingGuard::enter(&self.in_flight);
        let tasks = self
            .store
            .list()
            .await
            .map_err(|err| remote_failure("list", err))?;
        let cache = TaskCache::from_tasks(tasks);
        let count = cache.len();

        let mut state = self.state.write().await;
        state.cache = cache;
        state.last_refresh = Some(OffsetDateTime::now_utc());
        drop(state);

        debug!(count, "Refreshed task cache");
        Ok(count)
    }

    /// Create a task and refetch.
    ///
    /// Content is trimmed; an explicit category must belong to the configured set.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyContent`] or [`ValidationError::UnknownCategory`]
    /// without calling the store, or the remote failure.
    pub async fn create(&self, new_task: &NewTask) -> SyncResult<Task> {
        let content = new_task.content.trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        if let Some(category) = &new_task.category {
            self.categories.validate_category(category)?;
        }
        let request = NewTask {
            content: content.to_owned(),
            ..new_task.clone()
        };

        let _loading = LoadingGuard::enter(&self.in_flight);
        let task = self
            .store
            .create(&request)
            .await
            .map_err(|err| remote_failure("create", err))?;
        debug!(task = %task.id, "Created task");
        self.refresh().await?;
        Ok(task)
    }

    /// Apply a partial update and refetch. Returns the task as now cached.
    ///
    /// Ids absent from the cache are still forwarded; the store decides.
    /// A category equal to the cached one is accepted even outside the label set.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] for blank content or an unknown category
    /// without calling the store, or the remote failure.
    pub async fn update(&self, id: TaskId, patch: &TaskPatch) -> SyncResult<Option<Task>> {
        if patch.content.as_deref().is_some_and(|content| content.trim().is_empty()) {
            return Err(ValidationError::EmptyContent.into());
        }
        if let Some(category) = &patch.category {
            // Store-assigned labels may sit outside the configured set; keeping one is fine.
            let unchanged = self
                .task(id)
                .await
                .is_some_and(|task| &task.category == category);
            if !unchanged {
                self.categories.validate_category(category)?;
            }
        }

        let _loading = LoadingGuard::enter(&self.in_flight);
        self.store
            .update(id, patch)
            .await
            .map_err(|err| remote_failure("update", err))?;
        debug!(task = %id, "Updated task");
        self.refresh().await?;
        Ok(self.task(id).await)
    }

    /// Flip the completion flag relative to `current_done`.
    ///
    /// # Errors
    /// Same as [`update`](Self::update).
    pub async fn toggle(&self, id: TaskId, current_done: bool) -> SyncResult<Option<Task>> {
        self.update(id, &TaskPatch::done(!current_done)).await
    }

    /// Delete a task and refetch.
    ///
    /// # Errors
    /// Returns the remote failure; the cache is kept then.
    pub async fn remove(&self, id: TaskId) -> SyncResult<()> {
        let _loading = LoadingGuard::enter(&self.in_flight);
        self.store
            .remove(id)
            .await
            .map_err(|err| remote_failure("remove", err))?;
        debug!(task = %id, "Removed task");
        self.refresh().await?;
        Ok(())
    }

    /// Submit a sort-order batch in one call and refetch. An empty batch is a no-op.
    ///
    /// # Errors
    /// Returns the remote failure; the cache is kept then.
    pub async fn reorder(&self, entries: &[SortEntry]) -> SyncResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let _loading = LoadingGuard::enter(&self.in_flight);
        self.store
            .reorder(entries)
            .await
            .map_err(|err| remote_failure("reorder", err))?;
        debug!(count = entries.len(), "Reordered tasks");
        self.refresh().await?;
        Ok(())
    }

    /// Move the item at `old_index` of the displayed sequence to `new_index`
    /// and persist the resulting order.
    ///
    /// Returns `false` without calling the store when the move is a no-op or
    /// an index is out of range.
    ///
    /// # Errors
    /// Returns the remote failure of the reorder call.
    pub async fn move_task(&self, displayed: &[Task], old_index: usize, new_index: usize) -> SyncResult<bool> {
        let Some(batch) = plan_move(displayed, old_index, new_index) else {
            debug!(old_index, new_index, len = displayed.len(), "Ignored no-op move");
            return Ok(false);
        };
        self.reorder(&batch).await?;
        Ok(true)
    }

    /// Fetch the full collection for export.
    ///
    /// # Errors
    /// Returns the remote failure.
    pub async fn export(&self) -> SyncResult<TaskExport> {
        let _loading = LoadingGuard::enter(&self.in_flight);
        let export = self
            .store
            .export()
            .await
            .map_err(|err| remote_failure("export", err))?;
        debug!(count = export.tasks.len(), "Exported tasks");
        Ok(export)
    }

    /// Import a batch of tasks and refetch.
    ///
    /// # Errors
    /// Returns the remote failure; the cache is kept then.
    pub async fn import(&self, tasks: &[Task]) -> SyncResult<ImportSummary> {
        let _loading = LoadingGuard::enter(&self.in_flight);
        let summary = self
            .store
            .import(tasks)
            .await
            .map_err(|err| remote_failure("import", err))?;
        debug!(count = summary.imported_count, "Imported tasks");
        self.refresh().await?;
        Ok(summary)
    }

    /// Validate an import document, then [`import`](Self::import) its tasks.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidImport`] without calling the store
    /// when the document has no `tasks` array, or the remote failure.
    pub async fn import_json(&self, raw: &str) -> SyncResult<ImportSummary> {
        let tasks = parse_import_document(raw)?;
        self.import(&tasks).await
    }

    /// Snapshot of the current cache.
    pub async fn cache(&self) -> TaskCache {
        self.state.read().await.cache.clone()
    }

    /// Cached task by id.
    pub async fn task(&self, id: TaskId) -> Option<Task> {
        self.state.read().await.cache.get(id).cloned()
    }

    /// Cached tasks matching `criteria`, in display order.
    pub async fn filtered(&self, criteria: &FilterCriteria, now: OffsetDateTime) -> Vec<Task> {
        self.state.read().await.cache.filtered_tasks(criteria, now)
    }

    /// Time of the last successful refresh.
    pub async fn last_refresh(&self) -> Option<OffsetDateTime> {
        self.state.read().await.last_refresh
    }

    /// Drop every cached task.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.cache = TaskCache::default();
        state.last_refresh = None;
        drop(state);
        debug!("Cleared task cache");
    }
}
