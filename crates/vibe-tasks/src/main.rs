//! CLI entry point for vibe-tasks.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use time::OffsetDateTime;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};
use vibe_tasks_app::{ClientConfig, SyncController};
use vibe_tasks_store_local::LocalStore;

mod commands;

/// Personal task list kept in sync with its store after every change.
#[derive(Parser, Debug)]
#[command(name = "vibe-tasks", version, about = "vibe-tasks: a personal task tracker")]
struct Cli {
    /// Configuration file (defaults to <config dir>/vibe-tasks/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Task file, overriding `[store] path`.
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

/// Filters shared by `ls` and `mv`.
#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Category, matched exactly or as a substring (`all`/`全部` for any).
    #[arg(long)]
    category: Option<String>,
    /// Priority: 1/2/3, low/medium/high or 普通/重要/紧急.
    #[arg(long)]
    priority: Option<String>,
    /// Deadline window: today, tomorrow, this_week, this_month (or 今天/明天/本周/本月).
    #[arg(long)]
    deadline: Option<String>,
    /// Case-insensitive text search over content and category.
    #[arg(long)]
    search: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
enum LsFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks in display order.
    Ls {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },

    /// Create a task. Without a category the store picks one from the content.
    Add {
        content: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// RFC3339 timestamp or YYYY-MM-DD.
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Mark a task as done.
    Done { task: String },

    /// Mark a task as not done.
    Undone { task: String },

    /// Edit content, category or priority of a task.
    Edit {
        task: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<String>,
    },

    /// Delete a task.
    Rm { task: String },

    /// Move the task at position FROM to position TO (1-based, within the filtered list).
    Mv {
        from: usize,
        to: usize,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Export every task as JSON.
    Export {
        /// Write to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Import tasks from a JSON document holding a `tasks` array.
    Import { file: PathBuf },
}

fn main() -> Result<()> {
    let Cli { config, store, cmd } = Cli::parse();
    install_tracing();

    let config = load_config(config.as_deref())?;
    let store = open_store(store.or_else(|| config.store.path.clone()))?;
    let controller = SyncController::new(store, config.categories);

    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    tokio::runtime::Runtime::new()?.block_on(commands::run(cmd, &controller, now))
}

fn load_config(explicit: Option<&Path>) -> Result<ClientConfig> {
    if let Some(path) = explicit {
        return ClientConfig::from_path(path);
    }
    dirs::config_dir().map_or_else(|| Ok(ClientConfig::default()), ClientConfig::load)
}

fn open_store(path: Option<PathBuf>) -> Result<LocalStore> {
    let path = path.or_else(|| dirs::data_dir().map(|dir| dir.join("vibe-tasks").join("tasks.json")));
    let Some(path) = path else {
        debug!("No data directory available; using an in-memory store");
        return Ok(LocalStore::in_memory());
    };
    LocalStore::open(&path).with_context(|| format!("failed to open task file {}", path.display()))
}

fn install_tracing() {
    // RUST_LOG is honoured; INFO by default.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
