//! Partial task mutations shared by the board store and remote stores.

use crate::{Status, Task};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Fields of a task edit form, as submitted by a frontend.
#[derive(Debug, Clone)]
pub struct TaskEdit {
    /// Desired title.
    pub title: String,
    /// Desired description.
    pub description: String,
    /// Desired column.
    pub status: Status,
}

/// Sparse update payload; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// Overwrite the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Overwrite the description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Move the task to another column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl TaskPatch {
    /// Patch that only moves the task to `status`.
    #[must_use]
    pub const fn status(status: Status) -> Self {
        Self {
            title: None,
            description: None,
            status: Some(status),
        }
    }

    /// Compute a patch by comparing a task with the submitted edit.
    ///
    /// Unchanged fields are omitted so the remote write stays minimal.
    #[must_use]
    pub fn diff(current: &Task, edit: TaskEdit) -> Self {
        let TaskEdit {
            title,
            description,
            status,
        } = edit;

        Self {
            title: (title != current.title).then_some(title),
            description: (description != current.description).then_some(description),
            status: (status != current.status).then_some(status),
        }
    }

    /// Returns true when applying the patch would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }

    /// Apply the patch to a task in place, stamping `updated_at`.
    ///
    /// `updated_at` never moves backwards, even when the caller supplies a
    /// timestamp older than the task's current one.
    pub fn apply(&self, task: &mut Task, now: OffsetDateTime) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        task.updated_at = task.updated_at.max(now);
    }
}
