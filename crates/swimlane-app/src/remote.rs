//! Contract between the board store and a remote task store.

use anyhow::Error;
use swimlane_core::id::{TaskId, UserId};
use swimlane_core::patch::TaskPatch;
use swimlane_core::{Task, TaskDraft};
use swimlane_store_mem::MemoryStore;
use tokio::sync::mpsc::UnboundedReceiver;

/// Live stream of task-list snapshots for one user.
///
/// Replaces the subscribe/unsubscribe function pairs of callback-style
/// realtime SDKs with a single owned handle: dropping the feed ends the
/// subscription from the consumer's side.
pub struct TaskFeed<E> {
    rx: UnboundedReceiver<Result<Vec<Task>, E>>,
}

impl<E> TaskFeed<E> {
    /// Wrap a raw notification channel.
    #[must_use]
    pub const fn new(rx: UnboundedReceiver<Result<Vec<Task>, E>>) -> Self {
        Self { rx }
    }

    /// Wait for the next delivery; `None` once the remote closes the feed.
    pub async fn next(&mut self) -> Option<Result<Vec<Task>, E>> {
        self.rx.recv().await
    }
}

/// Remote system of record for tasks.
///
/// Every method is a single-shot asynchronous call: it either resolves or
/// rejects once, with no retries or timeouts at this layer. The remote
/// assigns task identifiers and timestamps on create and bumps
/// `updated_at` on update.
#[allow(async_fn_in_trait)]
pub trait RemoteTaskStore: Send + Sync {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error> + Send + 'static;

    /// Persist a new task and return it with its assigned identity.
    ///
    /// # Errors
    /// Returns a store-specific error when the write is rejected.
    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, Self::Error>;

    /// Apply a partial update to an existing task.
    ///
    /// # Errors
    /// Returns a store-specific error when the write is rejected.
    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<(), Self::Error>;

    /// Remove a task.
    ///
    /// # Errors
    /// Returns a store-specific error when the write is rejected.
    async fn delete_task(&self, id: TaskId) -> Result<(), Self::Error>;

    /// Open a live feed of the given user's tasks.
    ///
    /// The first delivery carries the data already present; each
    /// acknowledged write for that user pushes a fresh list.
    ///
    /// # Errors
    /// Returns a store-specific error when the subscription cannot be
    /// established.
    async fn subscribe_by_user(&self, user: UserId) -> Result<TaskFeed<Self::Error>, Self::Error>;
}

impl RemoteTaskStore for MemoryStore {
    type Error = swimlane_store_mem::MemoryStoreError;

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, Self::Error> {
        Self::create_task(self, draft)
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<(), Self::Error> {
        Self::update_task(self, id, patch)
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), Self::Error> {
        Self::delete_task(self, id)
    }

    async fn subscribe_by_user(&self, user: UserId) -> Result<TaskFeed<Self::Error>, Self::Error> {
        Ok(TaskFeed::new(Self::subscribe_by_user(self, user)))
    }
}
