use std::fs;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use time::OffsetDateTime;
use time::macros::format_description;
use vibe_tasks_app::{
    DraftEditor, DraftField, FilterCriteriaBuilder, RemoteTaskStore, SyncController, SyncError, TaskCache,
    parse_deadline,
};
use vibe_tasks_core::id::TaskId;
use vibe_tasks_core::{FilterCriteria, NewTask, Priority, Task};

use crate::{Command, FilterArgs, LsFormat};

/// Shortest id prefix accepted on the command line.
const MIN_ID_PREFIX: usize = 4;

pub async fn run<S: RemoteTaskStore>(
    command: Command,
    controller: &SyncController<S>,
    now: OffsetDateTime,
) -> Result<()> {
    controller.refresh().await.map_err(user_facing)?;

    match command {
        Command::Ls { filter, format } => handle_ls(controller, &filter, format, now).await,
        Command::Add {
            content,
            category,
            priority,
            deadline,
        } => handle_add(controller, content, category, priority, deadline, now).await,
        Command::Done { task } => handle_set_done(controller, &task, true).await,
        Command::Undone { task } => handle_set_done(controller, &task, false).await,
        Command::Edit {
            task,
            content,
            category,
            priority,
        } => handle_edit(controller, &task, content, category, priority).await,
        Command::Rm { task } => handle_rm(controller, &task).await,
        Command::Mv { from, to, filter } => handle_mv(controller, from, to, &filter, now).await,
        Command::Export { output } => handle_export(controller, output.as_deref()).await,
        Command::Import { file } => handle_import(controller, &file).await,
    }
}

fn user_facing(err: SyncError) -> anyhow::Error {
    let message = err.describe_user_facing();
    anyhow::Error::new(err).context(message)
}

fn build_filter(args: &FilterArgs) -> Result<FilterCriteria> {
    let builder = FilterCriteriaBuilder::new()
        .with_category(args.category.clone())
        .with_text(args.search.clone())
        .with_priority(args.priority.as_deref())
        .and_then(|builder| builder.with_deadline(args.deadline.as_deref()))
        .map_err(|err| anyhow!(err.describe_user_facing()))?;
    Ok(builder.build())
}

fn parse_priority(token: Option<&str>) -> Result<Option<Priority>> {
    token
        .map(|raw| Priority::from_str(raw).map_err(|err| anyhow!(err)))
        .transpose()
}

/// Resolve a full id or a unique id prefix against the cache.
fn resolve_task(cache: &TaskCache, token: &str) -> Result<Task> {
    let token = token.trim();
    if let Ok(id) = TaskId::from_str(token) {
        return cache
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("task {id} not found"));
    }
    if token.len() < MIN_ID_PREFIX {
        bail!("task id prefix '{token}' is too short (at least {MIN_ID_PREFIX} characters)");
    }
    let needle = token.to_lowercase();
    let mut matches = cache
        .tasks()
        .iter()
        .filter(|task| task.id.to_string().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task.clone()),
        (None, _) => bail!("no task matches '{token}'"),
        (Some(_), Some(_)) => bail!("task id prefix '{token}' is ambiguous"),
    }
}

async fn handle_ls<S: RemoteTaskStore>(
    controller: &SyncController<S>,
    filter: &FilterArgs,
    format: LsFormat,
    now: OffsetDateTime,
) -> Result<()> {
    let criteria = build_filter(filter)?;
    let tasks = controller.filtered(&criteria, now).await;

    if tasks.is_empty() {
        if criteria.is_empty() {
            println!("No tasks found");
        } else {
            println!("No tasks matched the provided filters");
        }
        return Ok(());
    }

    match format {
        LsFormat::Table => {
            for (position, task) in tasks.iter().enumerate() {
                println!("{}", render_row(position + 1, task));
            }
        }
        LsFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
    }
    Ok(())
}

fn render_row(position: usize, task: &Task) -> String {
    let id = task.id.to_string();
    let short_id = id.get(..8).unwrap_or(id.as_str());
    let mark = if task.is_done { "x" } else { " " };
    let deadline = task
        .deadline
        .and_then(|deadline| deadline.format(format_description!("[year]-[month]-[day] [hour]:[minute]")).ok())
        .map(|formatted| format!("  due {formatted}"))
        .unwrap_or_default();
    format!(
        "{position:>3}. [{mark}] {short_id}  {}  {}  {}{deadline}",
        task.priority.label(),
        task.category,
        task.content
    )
}

async fn handle_add<S: RemoteTaskStore>(
    controller: &SyncController<S>,
    content: String,
    category: Option<String>,
    priority: Option<String>,
    deadline: Option<String>,
    now: OffsetDateTime,
) -> Result<()> {
    let deadline = deadline
        .as_deref()
        .map(|raw| parse_deadline(raw, now.offset()))
        .transpose()
        .map_err(|err| anyhow!(err.describe_user_facing()))?;
    let new_task = NewTask {
        content,
        category,
        priority: parse_priority(priority.as_deref())?,
        deadline,
    };
    let task = controller.create(&new_task).await.map_err(user_facing)?;
    println!("Created task {} [{}]", task.id, task.category);
    Ok(())
}

async fn handle_set_done<S: RemoteTaskStore>(
    controller: &SyncController<S>,
    token: &str,
    done: bool,
) -> Result<()> {
    let task = resolve_task(&controller.cache().await, token)?;
    if task.is_done == done {
        println!("Task {} is already {}", task.id, if done { "done" } else { "open" });
        return Ok(());
    }
    controller
        .toggle(task.id, task.is_done)
        .await
        .map_err(user_facing)?;
    println!("Marked task {} as {}", task.id, if done { "done" } else { "open" });
    Ok(())
}

async fn handle_edit<S: RemoteTaskStore>(
    controller: &SyncController<S>,
    token: &str,
    content: Option<String>,
    category: Option<String>,
    priority: Option<String>,
) -> Result<()> {
    let task = resolve_task(&controller.cache().await, token)?;
    let priority = parse_priority(priority.as_deref())?;

    let mut editor = DraftEditor::default();
    editor.start(&task);
    let fields = [
        content.map(DraftField::Content),
        category.map(DraftField::Category),
        priority.map(DraftField::Priority),
    ];
    for field in fields.into_iter().flatten() {
        editor.update_field(field);
    }
    editor
        .commit(controller)
        .await
        .map_err(user_facing)
        .with_context(|| format!("failed to edit task {}", task.id))?;
    println!("Updated task {}", task.id);
    Ok(())
}

async fn handle_rm<S: RemoteTaskStore>(controller: &SyncController<S>, token: &str) -> Result<()> {
    let task = resolve_task(&controller.cache().await, token)?;
    controller.remove(task.id).await.map_err(user_facing)?;
    println!("Removed task {}", task.id);
    Ok(())
}

async fn handle_mv<S: RemoteTaskStore>(
    controller: &SyncController<S>,
    from: usize,
    to: usize,
    filter: &FilterArgs,
    now: OffsetDateTime,
) -> Result<()> {
    let criteria = build_filter(filter)?;
    let displayed = controller.filtered(&criteria, now).await;
    let (Some(old_index), Some(new_index)) = (from.checked_sub(1), to.checked_sub(1)) else {
        bail!("positions start at 1");
    };
    if old_index >= displayed.len() || new_index >= displayed.len() {
        bail!("positions must be between 1 and {}", displayed.len());
    }
    if controller
        .move_task(&displayed, old_index, new_index)
        .await
        .map_err(user_facing)?
    {
        println!("Moved task from position {from} to {to}");
    } else {
        println!("Nothing to move");
    }
    Ok(())
}

async fn handle_export<S: RemoteTaskStore>(
    controller: &SyncController<S>,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let export = controller.export().await.map_err(user_facing)?;
    let body = export.to_json_pretty()?;
    match output {
        Some(path) => {
            fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} tasks to {}", export.tasks.len(), path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

async fn handle_import<S: RemoteTaskStore>(
    controller: &SyncController<S>,
    file: &std::path::Path,
) -> Result<()> {
    let raw = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let summary = controller.import_json(&raw).await.map_err(user_facing)?;
    println!("{} ({})", summary.message, summary.imported_count);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use tempfile::TempDir;
    use time::macros::datetime;
    use vibe_tasks_app::CategoryConfig;
    use vibe_tasks_store_local::LocalStore;

    fn controller() -> SyncController<LocalStore> {
        SyncController::new(LocalStore::in_memory(), CategoryConfig::default())
    }

    fn now() -> OffsetDateTime {
        datetime!(2025-06-10 10:00 +8)
    }

    fn add(content: &str, category: Option<&str>, priority: Option<&str>) -> Command {
        Command::Add {
            content: content.into(),
            category: category.map(str::to_owned),
            priority: priority.map(str::to_owned),
            deadline: None,
        }
    }

    #[tokio::test]
    async fn add_done_and_rm_flow_through_the_controller() {
        let controller = controller();
        run(add("buy milk", Some("购物"), Some("2")), &controller, now()).await.unwrap();
        let task = controller.cache().await.tasks()[0].clone();
        assert_eq!(task.priority, Priority::Medium);

        let prefix = task.id.to_string()[..8].to_owned();
        run(Command::Done { task: prefix.clone() }, &controller, now()).await.unwrap();
        assert!(controller.task(task.id).await.unwrap().is_done);

        run(Command::Rm { task: prefix }, &controller, now()).await.unwrap();
        assert!(controller.cache().await.is_empty());
    }

    #[tokio::test]
    async fn edit_goes_through_the_draft_editor() {
        let controller = controller();
        run(add("draft report", Some("工作"), None), &controller, now()).await.unwrap();
        let task = controller.cache().await.tasks()[0].clone();

        run(
            Command::Edit {
                task: task.id.to_string(),
                content: Some("final report".into()),
                category: None,
                priority: Some("紧急".into()),
            },
            &controller,
            now(),
        )
        .await
        .unwrap();

        let updated = controller.task(task.id).await.unwrap();
        assert_eq!(updated.content, "final report");
        assert_eq!(updated.category, "工作");
        assert_eq!(updated.priority, Priority::High);
    }

    #[tokio::test]
    async fn mv_uses_positions_within_the_filtered_list() {
        let controller = controller();
        for (content, category) in [("w1", "工作"), ("h1", "日常"), ("w2", "工作")] {
            run(add(content, Some(category), None), &controller, now()).await.unwrap();
        }
        let filter = FilterArgs {
            category: Some("工作".into()),
            ..FilterArgs::default()
        };
        run(
            Command::Mv {
                from: 2,
                to: 1,
                filter: filter.clone(),
            },
            &controller,
            now(),
        )
        .await
        .unwrap();

        let criteria = build_filter(&filter).unwrap();
        let shown: Vec<String> = controller
            .filtered(&criteria, now())
            .await
            .into_iter()
            .map(|task| task.content)
            .collect();
        assert_eq!(shown, ["w2", "w1"]);

        let err = run(
            Command::Mv {
                from: 0,
                to: 1,
                filter,
            },
            &controller,
            now(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("start at 1"));
    }

    #[tokio::test]
    async fn export_then_import_duplicates_tasks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.json");
        let controller = controller();
        run(add("walk dog", None, None), &controller, now()).await.unwrap();

        run(Command::Export { output: Some(path.clone()) }, &controller, now()).await.unwrap();
        run(Command::Import { file: path }, &controller, now()).await.unwrap();

        assert_eq!(controller.cache().await.len(), 2);
    }

    #[tokio::test]
    async fn invalid_import_is_reported_in_user_terms() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"items": []}"#).unwrap();

        let err = run(Command::Import { file: path }, &controller(), now()).await.unwrap_err();
        assert_eq!(err.to_string(), "文件格式错误或数据无效");
    }

    #[test]
    fn resolve_rejects_short_and_unknown_prefixes() {
        let cache = TaskCache::default();
        assert!(resolve_task(&cache, "ab").is_err());
        assert!(resolve_task(&cache, "abcd1234").is_err());
    }

    #[test]
    fn render_row_shows_state_and_deadline() {
        let task = Task {
            id: TaskId::from_str("019a6ff3-119f-7661-869e-2a6c4fca5c4f").unwrap(),
            content: "dentist".into(),
            is_done: true,
            category: "日常".into(),
            priority: Priority::High,
            deadline: Some(datetime!(2025-06-11 09:30 +8)),
            sort_order: 0,
        };
        assert_eq!(
            render_row(1, &task),
            "  1. [x] 019a6ff3  紧急  日常  dentist  due 2025-06-11 09:30"
        );
    }
}
