//! CLI entry point for the swimlane task board.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Kanban board over a JSON-file-backed task store.
#[derive(Parser, Debug)]
#[command(
    name = "swimlane",
    version,
    about = "swimlane: move tasks across To Do / In Progress / Done"
)]
struct Cli {
    /// Path to the board file (defaults to .swimlane/board.json).
    #[arg(long)]
    board: Option<String>,

    /// Act as this user id (defaults to SWIMLANE_USER_ID or the local user).
    #[arg(long)]
    user: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new task.
    New {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "todo")]
        status: String,
    },

    /// Show the board, column by column.
    Ls,

    /// Move a task to another column, by target or by drag distance.
    Mv {
        #[arg(long)]
        task: String,
        /// Destination column (todo, in-progress, done).
        #[arg(long, conflicts_with = "drag")]
        to: Option<String>,
        /// Signed horizontal drag displacement in points.
        #[arg(long, allow_hyphen_values = true)]
        drag: Option<f32>,
    },

    /// Edit title, description, or status of a task.
    Edit {
        #[arg(long)]
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a task.
    Rm {
        #[arg(long)]
        task: String,
    },
}

fn main() -> Result<()> {
    install_tracing();
    let cli = Cli::parse();
    tokio::runtime::Runtime::new()?.block_on(commands::run(cli.board, cli.user, cli.cmd))
}

fn install_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
