//! Optimistic task store: the authoritative local view of one user's board.
//!
//! Mutations apply to the local list immediately and are then pushed to the
//! remote store; a rejected write rolls the specific optimistic change back
//! to the snapshot captured when the mutation began. The live subscription
//! opened by [`BoardStore::load_for_user`] is the single refresh path: every
//! remote change notification replaces the local list wholesale.

use std::sync::Arc;

use swimlane_core::id::{TaskId, UserId};
use swimlane_core::patch::TaskPatch;
use swimlane_core::{Status, Task, TaskDraft};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::remote::RemoteTaskStore;

/// Errors surfaced by [`BoardStore`] operations.
///
/// None of these are fatal; the store stays usable after any failure.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Create was rejected locally: the title has no visible characters.
    /// The remote store is never contacted for such drafts.
    #[error("task title must not be empty")]
    EmptyTitle,
    /// The mutation target is not in the local task list.
    #[error("unknown task {0}")]
    UnknownTask(TaskId),
    /// The remote store rejected a create/update/delete; the optimistic
    /// change has been rolled back.
    #[error("remote write failed: {source}")]
    RemoteWrite {
        /// Underlying store error.
        #[source]
        source: anyhow::Error,
    },
    /// The subscription could not be established; local state is
    /// untouched.
    #[error("remote read failed: {source}")]
    RemoteRead {
        /// Underlying store error.
        #[source]
        source: anyhow::Error,
    },
}

/// Handle for one user's live subscription.
///
/// Dropping the handle (or calling [`shutdown`](Self::shutdown)) tears the
/// subscription down deterministically: once either has happened, no
/// notification for that user can mutate the board again.
#[derive(Debug)]
pub struct BoardSubscription {
    user: UserId,
    handle: JoinHandle<()>,
}

impl BoardSubscription {
    /// User this subscription is scoped to.
    #[must_use]
    pub const fn user(&self) -> UserId {
        self.user
    }

    /// Tear the subscription down explicitly.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for BoardSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// In-memory task list for the signed-in user, synchronized with a remote
/// store under the optimistic-update/rollback discipline.
///
/// All snapshots handed out are clones; callers never mutate tasks
/// directly, they issue intents (`create`, `move_status`, `update`,
/// `delete`).
#[derive(Clone)]
pub struct BoardStore<S> {
    remote: S,
    tasks: Arc<Mutex<Vec<Task>>>,
}

impl<S> BoardStore<S> {
    /// Wrap a remote store with an empty local list.
    #[must_use]
    pub fn new(remote: S) -> Self {
        Self {
            remote,
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<S: RemoteTaskStore> BoardStore<S> {
    /// Clone of the current task list, in insertion order.
    pub async fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    /// Establish the live subscription for `user`.
    ///
    /// Replaces the local list on every remote change notification until
    /// the returned handle is dropped. A delivery error is logged and
    /// leaves the list at its last known-good value.
    ///
    /// # Errors
    /// Returns [`BoardError::RemoteRead`] when the subscription cannot be
    /// established.
    pub async fn load_for_user(&self, user: UserId) -> Result<BoardSubscription, BoardError> {
        let mut feed = self
            .remote
            .subscribe_by_user(user)
            .await
            .map_err(|e| BoardError::RemoteRead { source: e.into() })?;

        let tasks = Arc::clone(&self.tasks);
        let handle = tokio::spawn(async move {
            while let Some(item) = feed.next().await {
                match item {
                    Ok(batch) => *tasks.lock().await = batch,
                    Err(err) => {
                        let err: anyhow::Error = err.into();
                        warn!(user = %user, error = %err, "subscription delivery failed");
                    }
                }
            }
        });
        Ok(BoardSubscription { user, handle })
    }

    /// Create a task.
    ///
    /// The task only becomes visible once the remote has acknowledged it
    /// and assigned its identity; there is no optimistic insert.
    ///
    /// # Errors
    /// Returns [`BoardError::EmptyTitle`] for blank titles (before any
    /// remote call) or [`BoardError::RemoteWrite`] when the remote rejects
    /// the create.
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, BoardError> {
        if draft.has_blank_title() {
            return Err(BoardError::EmptyTitle);
        }

        let task = self
            .remote
            .create_task(&draft)
            .await
            .map_err(|e| BoardError::RemoteWrite { source: e.into() })?;

        let mut tasks = self.tasks.lock().await;
        // The subscription may already have delivered the new task.
        if !tasks.iter().any(|t| t.id == task.id) {
            tasks.push(task.clone());
        }
        Ok(task)
    }

    /// Move a task to another column, optimistically.
    ///
    /// # Errors
    /// Returns [`BoardError::UnknownTask`] when the task is not in the
    /// local list, or [`BoardError::RemoteWrite`] after rolling the local
    /// change back.
    pub async fn move_status(&self, id: TaskId, new_status: Status) -> Result<(), BoardError> {
        self.update(id, TaskPatch::status(new_status)).await
    }

    /// Apply a partial edit, optimistically.
    ///
    /// The pre-mutation task is captured as the rollback value. On remote
    /// failure the rollback only fires if the task still holds exactly
    /// what this mutation wrote, so a stale failure never clobbers a newer
    /// optimistic update. No version is tracked against the remote: with
    /// concurrent writers the remote is last-writer-wins and the rollback
    /// value is the local pre-mutation state, not necessarily the remote's.
    ///
    /// # Errors
    /// Returns [`BoardError::UnknownTask`] or [`BoardError::RemoteWrite`].
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<(), BoardError> {
        if patch.is_empty() {
            return Ok(());
        }

        let (prior, applied) = {
            let mut tasks = self.tasks.lock().await;
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(BoardError::UnknownTask(id))?;
            let prior = task.clone();
            patch.apply(task, OffsetDateTime::now_utc());
            (prior, task.clone())
        };

        match self.remote.update_task(id, &patch).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.rollback(prior, &applied).await;
                Err(BoardError::RemoteWrite { source: err.into() })
            }
        }
    }

    /// Delete a task, optimistically.
    ///
    /// On remote failure the task is restored at its original position.
    ///
    /// # Errors
    /// Returns [`BoardError::UnknownTask`] or [`BoardError::RemoteWrite`].
    pub async fn delete(&self, id: TaskId) -> Result<(), BoardError> {
        let (index, prior) = {
            let mut tasks = self.tasks.lock().await;
            let index = tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or(BoardError::UnknownTask(id))?;
            (index, tasks.remove(index))
        };

        match self.remote.delete_task(id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let mut tasks = self.tasks.lock().await;
                if !tasks.iter().any(|t| t.id == id) {
                    warn!(task = %id, "remote delete failed, restoring task");
                    let at = index.min(tasks.len());
                    tasks.insert(at, prior);
                }
                Err(BoardError::RemoteWrite { source: err.into() })
            }
        }
    }

    /// Revert `applied` back to `prior`, unless a newer local mutation has
    /// already overwritten what this mutation wrote.
    async fn rollback(&self, prior: Task, applied: &Task) {
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.iter_mut().find(|t| t.id == prior.id) {
            if *task == *applied {
                warn!(task = %prior.id, "remote write failed, rolling back");
                *task = prior;
            }
        }
    }
}
