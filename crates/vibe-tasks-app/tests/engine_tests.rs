//! End-to-end behaviour of the sync engine against the local store.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use time::OffsetDateTime;
use time::macros::datetime;
use vibe_tasks_app::{
    CategoryConfig, DraftEditor, FilterCriteriaBuilder, ImportSummary, RemoteError, RemoteTaskStore,
    SyncController, TaskExport,
};
use vibe_tasks_core::id::TaskId;
use vibe_tasks_core::{NewTask, Priority, SortEntry, Task, TaskPatch};
use vibe_tasks_store_local::LocalStore;

/// Local store that counts calls per operation.
#[derive(Default)]
struct CountingStore {
    inner: LocalStore,
    updates: AtomicUsize,
    lists: AtomicUsize,
    reorders: Mutex<Vec<Vec<SortEntry>>>,
}

impl RemoteTaskStore for CountingStore {
    type Error = RemoteError;

    async fn list(&self) -> Result<Vec<Task>, Self::Error> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.list().await?)
    }

    async fn create(&self, task: &NewTask) -> Result<Task, Self::Error> {
        Ok(self.inner.create(task).await?)
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, Self::Error> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(Some(self.inner.update(id, patch).await?))
    }

    async fn remove(&self, id: TaskId) -> Result<(), Self::Error> {
        Ok(self.inner.remove(id).await?)
    }

    async fn reorder(&self, entries: &[SortEntry]) -> Result<(), Self::Error> {
        self.reorders.lock().unwrap().push(entries.to_vec());
        Ok(self.inner.reorder(entries).await?)
    }

    async fn export(&self) -> Result<TaskExport, Self::Error> {
        Ok(TaskExport {
            tasks: self.inner.export().await?,
        })
    }

    async fn import(&self, tasks: &[Task]) -> Result<ImportSummary, Self::Error> {
        let imported_count = self.inner.import(tasks).await?;
        Ok(ImportSummary {
            message: "ok".into(),
            imported_count,
        })
    }
}

fn controller() -> SyncController<CountingStore> {
    SyncController::new(CountingStore::default(), CategoryConfig::default())
}

async fn seed(controller: &SyncController<CountingStore>, tasks: &[(&str, &str, Priority)]) {
    for (content, category, priority) in tasks {
        controller
            .create(&NewTask::new(*content).with_category(*category).with_priority(*priority))
            .await
            .expect("seed task");
    }
}

fn contents(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|task| task.content.clone()).collect()
}

#[tokio::test]
async fn reorder_round_trips_for_every_index_pair() {
    let labels = ["A", "B", "C", "D"];
    for old_index in 0..labels.len() {
        for new_index in 0..labels.len() {
            let controller = controller();
            for label in labels {
                controller.create(&NewTask::new(label)).await.expect("seed");
            }
            let displayed = controller.cache().await.tasks().to_vec();

            let moved = controller
                .move_task(&displayed, old_index, new_index)
                .await
                .expect("move");
            assert_eq!(moved, old_index != new_index);

            let mut expected = contents(&displayed);
            let item = expected.remove(old_index);
            expected.insert(new_index, item);

            let listed = controller.store().inner.list().await.expect("list");
            assert_eq!(contents(&listed), expected, "move {old_index} -> {new_index}");
            if moved {
                let submitted = controller.store().reorders.lock().unwrap().pop().expect("one batch");
                for entry in submitted {
                    let task = listed.iter().find(|task| task.id == entry.id).expect("listed");
                    assert_eq!(task.sort_order, entry.sort_order);
                }
            }
        }
    }
}

#[tokio::test]
async fn unchanged_draft_commit_issues_exactly_one_update() {
    let controller = controller();
    seed(&controller, &[("buy milk", "购物", Priority::Medium)]).await;
    let task = controller.cache().await.tasks()[0].clone();
    let before = controller.cache().await;
    let updates_before = controller.store().updates.load(Ordering::SeqCst);

    let mut editor = DraftEditor::default();
    editor.start(&task);
    editor.commit(&controller).await.expect("commit");

    assert_eq!(controller.store().updates.load(Ordering::SeqCst), updates_before + 1);
    assert_eq!(controller.cache().await, before);
    assert_eq!(editor, DraftEditor::Idle);
}

#[tokio::test]
async fn auto_classified_category_survives_an_unchanged_commit() {
    let controller = controller();
    controller.create(&NewTask::new("buy bread")).await.expect("create");
    let task = controller.cache().await.tasks()[0].clone();
    assert_eq!(task.category, "🛒 购物");

    let mut editor = DraftEditor::default();
    editor.start(&task);
    let committed = editor.commit(&controller).await.expect("commit").expect("cached");
    assert_eq!(committed.category, "🛒 购物");
}

#[tokio::test]
async fn cache_matches_store_after_every_mutation() {
    let controller = controller();
    seed(
        &controller,
        &[
            ("a", "日常", Priority::Low),
            ("b", "工作", Priority::High),
            ("c", "学习", Priority::Medium),
        ],
    )
    .await;
    let ids: Vec<TaskId> = controller.cache().await.tasks().iter().map(|t| t.id).collect();

    controller.toggle(ids[0], false).await.expect("toggle");
    assert_eq!(controller.cache().await.tasks(), controller.store().inner.list().await.unwrap());

    let displayed = controller.cache().await.tasks().to_vec();
    controller.move_task(&displayed, 2, 0).await.expect("move");
    assert_eq!(controller.cache().await.tasks(), controller.store().inner.list().await.unwrap());

    controller.remove(ids[1]).await.expect("remove");
    assert_eq!(controller.cache().await.tasks(), controller.store().inner.list().await.unwrap());

    let lists = controller.store().lists.load(Ordering::SeqCst);
    assert_eq!(lists, 6, "three creates and three mutations each refetch once");
}

#[tokio::test]
async fn category_filter_matches_equal_or_containing_labels() {
    let controller = SyncController::new(CountingStore::default(), CategoryConfig::unrestricted());
    seed(
        &controller,
        &[
            ("walk", "日常", Priority::Low),
            ("milk", "购物", Priority::Low),
            ("eggs", "🛒 购物", Priority::Medium),
            ("soap", "日常", Priority::High),
            ("shoes", "购物", Priority::High),
        ],
    )
    .await;

    let criteria = FilterCriteriaBuilder::new()
        .with_category(Some("购物".into()))
        .with_priority(Some("all"))
        .and_then(|builder| builder.with_deadline(Some("all")))
        .expect("criteria")
        .build();
    let shown = controller.filtered(&criteria, OffsetDateTime::now_utc()).await;
    assert_eq!(contents(&shown), ["milk", "eggs", "shoes"]);
}

#[tokio::test]
async fn deadline_and_priority_filters_combine() {
    let now = datetime!(2025-06-10 10:00 +8);
    let controller = controller();
    for (content, hours, priority) in [("soon", 2, Priority::High), ("later", 26, Priority::High), ("low", 3, Priority::Low)] {
        controller
            .create(
                &NewTask::new(content)
                    .with_priority(priority)
                    .with_deadline(now + time::Duration::hours(hours)),
            )
            .await
            .expect("create");
    }
    controller.create(&NewTask::new("undated")).await.expect("create");

    let today = FilterCriteriaBuilder::new()
        .with_deadline(Some("今天"))
        .and_then(|builder| builder.with_priority(Some("3")))
        .expect("criteria")
        .build();
    assert_eq!(contents(&controller.filtered(&today, now).await), ["soon"]);

    let this_week = FilterCriteriaBuilder::new()
        .with_deadline(Some("this_week"))
        .expect("criteria")
        .build();
    assert_eq!(
        contents(&controller.filtered(&this_week, now).await),
        ["soon", "later", "low"]
    );
}

#[tokio::test]
async fn reorder_under_filter_rewrites_only_displayed_tasks() {
    let controller = SyncController::new(CountingStore::default(), CategoryConfig::unrestricted());
    seed(
        &controller,
        &[
            ("w1", "工作", Priority::Low),
            ("h1", "日常", Priority::Low),
            ("w2", "工作", Priority::Low),
            ("h2", "日常", Priority::Low),
        ],
    )
    .await;
    let work = FilterCriteriaBuilder::new().with_category(Some("工作".into())).build();
    let now = OffsetDateTime::now_utc();
    let displayed = controller.filtered(&work, now).await;
    assert_eq!(contents(&displayed), ["w1", "w2"]);

    controller.move_task(&displayed, 1, 0).await.expect("move");

    assert_eq!(contents(&controller.filtered(&work, now).await), ["w2", "w1"]);
    let cache = controller.cache().await;
    let order_of = |content: &str| {
        cache
            .tasks()
            .iter()
            .find(|task| task.content == content)
            .map(|task| task.sort_order)
            .expect("task present")
    };
    assert_eq!(order_of("w2"), 0);
    assert_eq!(order_of("w1"), 1);
    assert_eq!(order_of("h1"), 1, "hidden tasks keep their sort order");
    assert_eq!(order_of("h2"), 3);
}
