//! In-process task store with server semantics for vibe-tasks.
//!
//! Assigns ids, appends new tasks at the end of the display order, classifies
//! uncategorized tasks and optionally persists the collection as a JSON file.

pub mod classify;
pub mod error;

pub use classify::classify_content;
pub use error::LocalStoreError;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex as StdMutex, PoisonError};
use tokio::sync::Mutex;
use tracing::{debug, info};
use vibe_tasks_core::id::TaskId;
use vibe_tasks_core::{NewTask, Priority, SortEntry, Task, TaskPatch};

/// Result alias for local store operations.
pub type Result<T> = std::result::Result<T, LocalStoreError>;

/// On-disk and in-memory representation of the collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    tasks: Vec<Task>,
}

impl StoreState {
    fn position(&self, id: TaskId) -> Result<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(LocalStoreError::TaskNotFound(id))
    }

    fn next_sort_order(&self) -> i64 {
        self.tasks
            .iter()
            .map(|task| task.sort_order)
            .max()
            .map_or(0, |max| max + 1)
    }

    fn sorted(&self) -> Vec<Task> {
        let mut tasks = self.tasks.clone();
        tasks.sort_by(Task::display_cmp);
        tasks
    }
}

/// Task store kept in process memory, optionally mirrored to a JSON file.
pub struct LocalStore {
    state: Mutex<StoreState>,
    path: Option<PathBuf>,
    required_credential: Option<String>,
    credential: StdMutex<Option<String>>,
}

impl LocalStore {
    /// Create an empty store that is never persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_state(StoreState::default(), None)
    }

    /// Create a non-persistent store seeded with existing tasks.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self::from_state(StoreState { tasks }, None)
    }

    /// Open a store backed by `path`, loading it when the file exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            StoreState::default()
        };
        debug!(path = %path.display(), count = state.tasks.len(), "Opened local store");
        Ok(Self::from_state(state, Some(path)))
    }

    fn from_state(state: StoreState, path: Option<PathBuf>) -> Self {
        Self {
            state: Mutex::new(state),
            path,
            required_credential: None,
            credential: StdMutex::new(None),
        }
    }

    /// Reject every call unless the presented credential equals `token`.
    #[must_use]
    pub fn require_credential(mut self, token: impl Into<String>) -> Self {
        self.required_credential = Some(token.into());
        self
    }

    /// Present (or withdraw) the bearer credential used for subsequent calls.
    pub fn set_credential(&self, token: Option<&str>) {
        *self
            .credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token.map(str::to_owned);
    }

    /// Path of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn authorize(&self) -> Result<()> {
        let Some(required) = &self.required_credential else {
            return Ok(());
        };
        let presented = self.credential.lock().unwrap_or_else(PoisonError::into_inner);
        if presented.as_deref() == Some(required.as_str()) {
            Ok(())
        } else {
            Err(LocalStoreError::Unauthorized)
        }
    }

    /// Apply `mutate` to a copy of the state, persist it, then publish it.
    ///
    /// A failed mutation or write leaves the published state untouched.
    async fn transact<T, F>(&self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut StoreState) -> Result<T>,
    {
        self.authorize()?;
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let value = mutate(&mut next)?;
        self.persist(&next).await?;
        *state = next;
        drop(state);
        Ok(value)
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        let body = serde_json::to_string_pretty(state)?;
        tokio::task::spawn_blocking(move || write_atomically(&path, &body))
            .await
            .map_err(|e| LocalStoreError::JoinError(e.to_string()))?
    }

    /// List every task in display order.
    ///
    /// # Errors
    /// Returns [`LocalStoreError::Unauthorized`] when the credential is rejected.
    pub async fn list(&self) -> Result<Vec<Task>> {
        self.authorize()?;
        let tasks = self.state.lock().await.sorted();
        debug!(count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    /// Create a task, assigning its id and appending it to the display order.
    ///
    /// # Errors
    /// Returns an error if the credential is rejected or persisting fails.
    pub async fn create(&self, new_task: &NewTask) -> Result<Task> {
        let task = self
            .transact(|state| {
                let category = new_task
                    .category
                    .clone()
                    .unwrap_or_else(|| classify_content(&new_task.content).to_owned());
                let task = Task {
                    id: TaskId::new(),
                    content: new_task.content.clone(),
                    is_done: false,
                    category,
                    priority: new_task.priority.unwrap_or(Priority::Low),
                    deadline: new_task.deadline,
                    sort_order: state.next_sort_order(),
                };
                state.tasks.push(task.clone());
                Ok(task)
            })
            .await?;
        info!(task = %task.id, sort_order = task.sort_order, "Created task");
        Ok(task)
    }

    /// Apply a partial update to an existing task.
    ///
    /// # Errors
    /// Returns [`LocalStoreError::TaskNotFound`] for unknown ids.
    pub async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        let task = self
            .transact(|state| {
                let idx = state.position(id)?;
                patch.clone().apply_to(&mut state.tasks[idx]);
                Ok(state.tasks[idx].clone())
            })
            .await?;
        info!(task = %id, "Updated task");
        Ok(task)
    }

    /// Delete a task.
    ///
    /// # Errors
    /// Returns [`LocalStoreError::TaskNotFound`] for unknown ids.
    pub async fn remove(&self, id: TaskId) -> Result<()> {
        self.transact(|state| {
            let idx = state.position(id)?;
            state.tasks.remove(idx);
            Ok(())
        })
        .await?;
        info!(task = %id, "Removed task");
        Ok(())
    }

    /// Persist a batch of sort orders. The batch is applied atomically.
    ///
    /// # Errors
    /// Returns [`LocalStoreError::TaskNotFound`] if any id is unknown; nothing is applied then.
    pub async fn reorder(&self, entries: &[SortEntry]) -> Result<()> {
        self.transact(|state| {
            for entry in entries {
                let idx = state.position(entry.id)?;
                state.tasks[idx].sort_order = entry.sort_order;
            }
            Ok(())
        })
        .await?;
        info!(count = entries.len(), "Reordered tasks");
        Ok(())
    }

    /// Snapshot every task for export, in display order.
    ///
    /// # Errors
    /// Returns [`LocalStoreError::Unauthorized`] when the credential is rejected.
    pub async fn export(&self) -> Result<Vec<Task>> {
        self.list().await
    }

    /// Append imported tasks under fresh ids, keeping their relative order.
    ///
    /// # Errors
    /// Returns an error if the credential is rejected or persisting fails.
    pub async fn import(&self, tasks: &[Task]) -> Result<usize> {
        let mut incoming = tasks.to_vec();
        incoming.sort_by(Task::display_cmp);
        let count = self
            .transact(|state| {
                let mut next = state.next_sort_order();
                for mut task in incoming {
                    task.id = TaskId::new();
                    task.sort_order = next;
                    next += 1;
                    state.tasks.push(task);
                }
                Ok(tasks.len())
            })
            .await?;
        info!(count, "Imported tasks");
        Ok(count)
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn write_atomically(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok<T>(result: Result<T>) -> T {
        result.unwrap_or_else(|err| panic!("store call failed: {err}"))
    }

    #[tokio::test]
    async fn create_appends_and_classifies() {
        let store = LocalStore::in_memory();
        let first = ok(store.create(&NewTask::new("buy milk")).await);
        let second = ok(store
            .create(&NewTask::new("quarterly review").with_category("工作").with_priority(Priority::High))
            .await);

        assert_eq!(first.sort_order, 0);
        assert_eq!(first.category, "🛒 购物");
        assert_eq!(first.priority, Priority::Low);
        assert_eq!(second.sort_order, 1);
        assert_eq!(second.category, "工作");
        assert_eq!(second.priority, Priority::High);
    }

    #[tokio::test]
    async fn list_returns_display_order() {
        let store = LocalStore::in_memory();
        let a = ok(store.create(&NewTask::new("a")).await);
        let b = ok(store.create(&NewTask::new("b")).await);
        ok(store
            .reorder(&[
                SortEntry { id: a.id, sort_order: 5 },
                SortEntry { id: b.id, sort_order: 2 },
            ])
            .await);

        let ids: Vec<TaskId> = ok(store.list().await).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn reorder_with_unknown_id_applies_nothing() {
        let store = LocalStore::in_memory();
        let a = ok(store.create(&NewTask::new("a")).await);
        let err = store
            .reorder(&[
                SortEntry { id: a.id, sort_order: 9 },
                SortEntry {
                    id: TaskId::new(),
                    sort_order: 0,
                },
            ])
            .await;
        assert!(matches!(err, Err(LocalStoreError::TaskNotFound(_))));
        assert_eq!(ok(store.list().await)[0].sort_order, 0);
    }

    #[tokio::test]
    async fn update_and_remove_unknown_ids_fail() {
        let store = LocalStore::in_memory();
        let missing = TaskId::new();
        assert!(matches!(
            store.update(missing, &TaskPatch::done(true)).await,
            Err(LocalStoreError::TaskNotFound(id)) if id == missing
        ));
        assert!(matches!(
            store.remove(missing).await,
            Err(LocalStoreError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn credential_is_enforced_when_required() {
        let store = LocalStore::in_memory().require_credential("secret");
        assert!(matches!(store.list().await, Err(LocalStoreError::Unauthorized)));
        store.set_credential(Some("secret"));
        assert!(ok(store.list().await).is_empty());
        store.set_credential(None);
        assert!(matches!(
            store.create(&NewTask::new("x")).await,
            Err(LocalStoreError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn import_assigns_fresh_ids_after_existing_tasks() {
        let store = LocalStore::in_memory();
        ok(store.create(&NewTask::new("existing")).await);
        let exported = ok(store.export().await);

        let count = ok(store.import(&exported).await);
        assert_eq!(count, 1);

        let tasks = ok(store.list().await);
        assert_eq!(tasks.len(), 2);
        assert_ne!(tasks[0].id, tasks[1].id);
        assert_eq!(tasks[1].content, "existing");
        assert_eq!(tasks[1].sort_order, 1);
    }
}
