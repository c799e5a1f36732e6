//! Command execution against the board store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use swimlane_app::{BoardConfig, BoardStore, session};
use swimlane_core::id::{TaskId, UserId};
use swimlane_core::patch::TaskPatch;
use swimlane_core::{Task, TaskDraft, columns, gesture};
use swimlane_store_mem::MemoryStore;
use time::format_description::well_known::Rfc3339;

use crate::Command;

const DEFAULT_BOARD_FILE: &str = ".swimlane/board.json";

/// Execute one CLI command against the board file.
pub async fn run(board: Option<String>, user: Option<String>, cmd: Command) -> Result<()> {
    let path = board.map_or_else(|| PathBuf::from(DEFAULT_BOARD_FILE), PathBuf::from);
    let user_id = resolve_user(user.as_deref())?;

    let remote = MemoryStore::with_tasks(load_tasks(&path)?);
    let store = BoardStore::new(remote.clone());
    let _subscription = store.load_for_user(user_id).await?;
    wait_for_initial_snapshot(&store, &remote, user_id).await;

    match cmd {
        Command::New {
            title,
            description,
            status,
        } => {
            let task = store
                .create(TaskDraft {
                    title,
                    description,
                    status: status.parse()?,
                    user_id,
                })
                .await?;
            println!("created {} ({})", task.id, task.status.column_title());
        }

        Command::Ls => render_board(&store.snapshot().await),

        Command::Mv { task, to, drag } => {
            let id: TaskId = task.parse().context("--task must be a task id")?;
            let destination = match (to, drag) {
                (Some(to), None) => to.parse()?,
                (None, Some(displacement)) => {
                    let origin = find_task(&store.snapshot().await, id)?.status;
                    let threshold = BoardConfig::load(".")?.drag.threshold();
                    gesture::classify(origin, displacement, threshold)
                }
                _ => bail!("specify exactly one of --to or --drag"),
            };
            store.move_status(id, destination).await?;
            println!("{id} -> {}", destination.column_title());
        }

        Command::Edit {
            task,
            title,
            description,
            status,
        } => {
            let id: TaskId = task.parse().context("--task must be a task id")?;
            let patch = TaskPatch {
                title,
                description,
                status: status.map(|s| s.parse()).transpose()?,
            };
            if patch.is_empty() {
                bail!("nothing to edit; pass --title, --description, or --status");
            }
            store.update(id, patch).await?;
            println!("updated {id}");
        }

        Command::Rm { task } => {
            let id: TaskId = task.parse().context("--task must be a task id")?;
            store.delete(id).await?;
            println!("deleted {id}");
        }
    }

    persist(&path, &remote.tasks())
}

fn resolve_user(user: Option<&str>) -> Result<UserId> {
    user.map_or_else(
        || Ok(session::default_user().id),
        |raw| raw.parse().context("--user must be a user id"),
    )
}

/// Let the live subscription deliver the seeded task list before the
/// command touches the board.
async fn wait_for_initial_snapshot(
    store: &BoardStore<MemoryStore>,
    remote: &MemoryStore,
    user: UserId,
) {
    let expected = remote.tasks_for_user(user).len();
    for _ in 0..256 {
        if store.snapshot().await.len() == expected {
            return;
        }
        tokio::task::yield_now().await;
    }
}

fn find_task(tasks: &[Task], id: TaskId) -> Result<&Task> {
    tasks
        .iter()
        .find(|t| t.id == id)
        .with_context(|| format!("unknown task {id}"))
}

fn render_board(tasks: &[Task]) {
    for column in columns(tasks) {
        println!("{} ({})", column.status.column_title(), column.tasks.len());
        for task in &column.tasks {
            let updated = task.updated_at.format(&Rfc3339).unwrap_or_default();
            println!("  {}  {}  (updated {updated})", task.id, task.title);
            if !task.description.is_empty() {
                println!("      {}", task.description);
            }
        }
    }
}

fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn persist(path: &Path, tasks: &[Task]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(tasks)?;
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}
