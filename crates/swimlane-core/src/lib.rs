//! Domain types for the swimlane task board.

/// Drag-release classification.
pub mod gesture;
/// Identifier types.
pub mod id;
/// Partial task mutations.
pub mod patch;

use crate::id::{TaskId, UserId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;

/// Column a task currently lives in.
///
/// The three values form a linear progression; `Ord` follows board order
/// (`Todo < InProgress < Done`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    /// Not started yet.
    Todo,
    /// Actively being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl Status {
    /// Board order, left to right.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Wire representation, matching the camelCase serde names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inProgress",
            Self::Done => "done",
        }
    }

    /// Column header shown to users.
    #[must_use]
    pub const fn column_title(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    /// One step forward in the progression, saturating at [`Status::Done`].
    #[must_use]
    pub const fn advanced(self) -> Self {
        match self {
            Self::Todo => Self::InProgress,
            Self::InProgress | Self::Done => Self::Done,
        }
    }

    /// One step back in the progression, saturating at [`Status::Todo`].
    #[must_use]
    pub const fn retreated(self) -> Self {
        match self {
            Self::Todo | Self::InProgress => Self::Todo,
            Self::Done => Self::InProgress,
        }
    }
}

/// Error returned when a status string cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown status '{0}', expected todo, in-progress, or done")]
pub struct ParseStatusError(String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "inProgress" | "in-progress" | "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(ParseStatusError(other.to_owned())),
        }
    }
}

/// A task on the board, as acknowledged by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Remote-assigned identifier.
    pub id: TaskId,
    /// Human-readable title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Column the task currently lives in.
    pub status: Status,
    /// Owner; tasks are scoped per signed-in user.
    pub user_id: UserId,
    #[serde(with = "time::serde::rfc3339")]
    /// Creation timestamp in UTC.
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    /// Timestamp of the most recent mutation, monotonically non-decreasing.
    pub updated_at: OffsetDateTime,
}

/// Create payload; the remote store assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    /// Title of the new task. Must not be blank.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Column the task starts in.
    pub status: Status,
    /// Owner of the new task.
    pub user_id: UserId,
}

impl TaskDraft {
    /// True when the title contains no visible characters.
    #[must_use]
    pub fn has_blank_title(&self) -> bool {
        self.title.trim().is_empty()
    }
}

/// Identity of a signed-in user, as reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier used to scope task subscriptions.
    pub id: UserId,
    /// Sign-in email.
    pub email: String,
    /// Name shown in the UI.
    pub display_name: String,
}

/// Derived view of one column: a status plus the tasks currently in it.
///
/// Columns are never stored; they are recomputed from the task list, with
/// tasks kept in the order of the backing list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<'a> {
    /// Status this column represents.
    pub status: Status,
    /// Tasks in the column, in insertion order.
    pub tasks: Vec<&'a Task>,
}

/// Partition a task list into the three board columns.
#[must_use]
pub fn columns(tasks: &[Task]) -> [Column<'_>; 3] {
    Status::ALL.map(|status| Column {
        status,
        tasks: tasks.iter().filter(|t| t.status == status).collect(),
    })
}
