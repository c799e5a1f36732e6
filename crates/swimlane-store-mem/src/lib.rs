//! In-memory remote task store with live per-user subscriptions.
//!
//! Stands in for the hosted realtime database: writes are acknowledged
//! synchronously, every acknowledged write pushes a fresh task list to the
//! owner's subscribers, and failures can be injected to exercise the
//! optimistic rollback paths of the board store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use swimlane_core::id::{TaskId, UserId};
use swimlane_core::patch::TaskPatch;
use swimlane_core::{Task, TaskDraft};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Errors surfaced by [`MemoryStore`].
#[derive(Debug, Clone, Error)]
pub enum MemoryStoreError {
    /// A write was rejected, either injected or because the target is gone.
    #[error("remote rejected write: {0}")]
    WriteRejected(String),
    /// A subscription delivery failed (injected).
    #[error("subscription delivery failed: {0}")]
    DeliveryFailed(String),
    /// The targeted task does not exist in the store.
    #[error("unknown task {0}")]
    UnknownTask(TaskId),
}

/// One message on a subscription feed: a fresh task list or a read error.
pub type FeedItem = Result<Vec<Task>, MemoryStoreError>;

struct Subscriber {
    user: UserId,
    tx: UnboundedSender<FeedItem>,
}

#[derive(Default)]
struct State {
    // BTreeMap over UUID v7 keys keeps tasks in creation order.
    tasks: BTreeMap<TaskId, Task>,
    subscribers: Vec<Subscriber>,
    fail_next_write: Option<String>,
    fail_next_delivery: Option<String>,
}

/// Shared in-memory store; clones refer to the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with existing tasks.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            state.tasks = tasks.into_iter().map(|t| (t.id, t)).collect();
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next write fail with the given message.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        self.lock().fail_next_write = Some(message.into());
    }

    /// Make the next subscription delivery carry an error instead of data.
    pub fn fail_next_delivery(&self, message: impl Into<String>) {
        self.lock().fail_next_delivery = Some(message.into());
    }

    fn take_injected_failure(state: &mut State) -> Result<(), MemoryStoreError> {
        state
            .fail_next_write
            .take()
            .map_or(Ok(()), |message| Err(MemoryStoreError::WriteRejected(message)))
    }

    /// Create a task, assigning its identifier and timestamps.
    ///
    /// # Errors
    /// Returns an error when a write failure has been injected.
    pub fn create_task(&self, draft: &TaskDraft) -> Result<Task, MemoryStoreError> {
        let mut state = self.lock();
        Self::take_injected_failure(&mut state)?;

        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: TaskId::new(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            status: draft.status,
            user_id: draft.user_id,
            created_at: now,
            updated_at: now,
        };
        debug!(task = %task.id, user = %task.user_id, "create task");
        state.tasks.insert(task.id, task.clone());
        Self::notify(&mut state, task.user_id);
        Ok(task)
    }

    /// Apply a partial update to a task, bumping `updated_at`.
    ///
    /// # Errors
    /// Returns an error when the task is unknown or a failure was injected.
    pub fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<(), MemoryStoreError> {
        let mut state = self.lock();
        Self::take_injected_failure(&mut state)?;

        let now = OffsetDateTime::now_utc();
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(MemoryStoreError::UnknownTask(id))?;
        patch.apply(task, now);
        let user = task.user_id;
        debug!(task = %id, "update task");
        Self::notify(&mut state, user);
        Ok(())
    }

    /// Remove a task.
    ///
    /// # Errors
    /// Returns an error when the task is unknown or a failure was injected.
    pub fn delete_task(&self, id: TaskId) -> Result<(), MemoryStoreError> {
        let mut state = self.lock();
        Self::take_injected_failure(&mut state)?;

        let task = state
            .tasks
            .remove(&id)
            .ok_or(MemoryStoreError::UnknownTask(id))?;
        debug!(task = %id, "delete task");
        Self::notify(&mut state, task.user_id);
        Ok(())
    }

    /// Open a live feed of the given user's tasks.
    ///
    /// The current task list is delivered immediately; every acknowledged
    /// write for that user pushes a fresh list. The feed ends when the
    /// receiver is dropped.
    #[must_use]
    pub fn subscribe_by_user(&self, user: UserId) -> UnboundedReceiver<FeedItem> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        // Mirrors the realtime database contract: subscribing fires once
        // with the data already present.
        let _ = tx.send(Ok(Self::tasks_of(&state, user)));
        state.subscribers.push(Subscriber { user, tx });
        rx
    }

    /// Snapshot of every task in the store, in creation order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.values().cloned().collect()
    }

    /// Snapshot of one user's tasks, in creation order.
    #[must_use]
    pub fn tasks_for_user(&self, user: UserId) -> Vec<Task> {
        Self::tasks_of(&self.lock(), user)
    }

    fn tasks_of(state: &State, user: UserId) -> Vec<Task> {
        state
            .tasks
            .values()
            .filter(|t| t.user_id == user)
            .cloned()
            .collect()
    }

    fn notify(state: &mut State, user: UserId) {
        let item: FeedItem = state.fail_next_delivery.take().map_or_else(
            || Ok(Self::tasks_of(state, user)),
            |message| Err(MemoryStoreError::DeliveryFailed(message)),
        );
        state
            .subscribers
            .retain(|sub| sub.user != user || sub.tx.send(item.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_core::Status;

    fn draft(user: UserId, title: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            description: String::new(),
            status: Status::Todo,
            user_id: user,
        }
    }

    #[test]
    fn create_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let task = store
            .create_task(&draft(user, "first"))
            .unwrap_or_else(|err| panic!("create must succeed: {err}"));

        assert_eq!(task.user_id, user);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(store.tasks_for_user(user), vec![task]);
    }

    #[test]
    fn subscribe_delivers_current_tasks_immediately() {
        let store = MemoryStore::new();
        let user = UserId::new();
        store
            .create_task(&draft(user, "pre-existing"))
            .unwrap_or_else(|err| panic!("create must succeed: {err}"));

        let mut feed = store.subscribe_by_user(user);
        let first = feed
            .try_recv()
            .unwrap_or_else(|err| panic!("feed must start with a snapshot: {err}"))
            .unwrap_or_else(|err| panic!("initial snapshot must be data: {err}"));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "pre-existing");
    }

    #[test]
    fn injected_delivery_failure_reaches_subscribers_once() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let mut feed = store.subscribe_by_user(user);
        let _ = feed.try_recv();

        store.fail_next_delivery("realtime channel dropped");
        store
            .create_task(&draft(user, "written anyway"))
            .unwrap_or_else(|err| panic!("create must succeed: {err}"));

        let item = feed
            .try_recv()
            .unwrap_or_else(|err| panic!("a delivery must arrive: {err}"));
        assert!(matches!(item, Err(MemoryStoreError::DeliveryFailed(_))));

        store
            .update_task(
                store.tasks_for_user(user)[0].id,
                &TaskPatch::status(Status::Done),
            )
            .unwrap_or_else(|err| panic!("update must succeed: {err}"));
        let item = feed
            .try_recv()
            .unwrap_or_else(|err| panic!("a delivery must arrive: {err}"));
        assert!(item.is_ok(), "delivery failure must be one-shot");
    }

    #[test]
    fn feed_is_scoped_to_its_user() {
        let store = MemoryStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let mut feed = store.subscribe_by_user(alice);
        let _ = feed.try_recv();

        store
            .create_task(&draft(bob, "bob's task"))
            .unwrap_or_else(|err| panic!("create must succeed: {err}"));
        assert!(feed.try_recv().is_err(), "alice must not see bob's writes");

        store
            .create_task(&draft(alice, "alice's task"))
            .unwrap_or_else(|err| panic!("create must succeed: {err}"));
        let tasks = feed
            .try_recv()
            .unwrap_or_else(|err| panic!("alice must see her write: {err}"))
            .unwrap_or_else(|err| panic!("delivery must be data: {err}"));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "alice's task");
    }

    #[test]
    fn dropped_feeds_are_pruned_on_the_next_write() {
        let store = MemoryStore::new();
        let user = UserId::new();
        drop(store.subscribe_by_user(user));

        store
            .create_task(&draft(user, "after drop"))
            .unwrap_or_else(|err| panic!("create must succeed: {err}"));
        assert!(store.lock().subscribers.is_empty());
    }

    #[test]
    fn injected_failure_rejects_exactly_one_write() {
        let store = MemoryStore::new();
        let user = UserId::new();
        store.fail_next_write("network down");

        let result = store.create_task(&draft(user, "doomed"));
        assert!(
            matches!(result, Err(MemoryStoreError::WriteRejected(ref m)) if m == "network down")
        );

        // The injection is one-shot; the retry goes through.
        let task = store
            .create_task(&draft(user, "retry"))
            .unwrap_or_else(|err| panic!("retry must succeed: {err}"));
        assert_eq!(task.title, "retry");
    }

    #[test]
    fn update_bumps_updated_at_and_delete_removes() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let task = store
            .create_task(&draft(user, "flow"))
            .unwrap_or_else(|err| panic!("create must succeed: {err}"));

        store
            .update_task(task.id, &TaskPatch::status(Status::Done))
            .unwrap_or_else(|err| panic!("update must succeed: {err}"));
        let updated = &store.tasks_for_user(user)[0];
        assert_eq!(updated.status, Status::Done);
        assert!(updated.updated_at >= task.updated_at);

        store
            .delete_task(task.id)
            .unwrap_or_else(|err| panic!("delete must succeed: {err}"));
        assert!(store.tasks_for_user(user).is_empty());
        assert!(matches!(
            store.delete_task(task.id),
            Err(MemoryStoreError::UnknownTask(_))
        ));
    }
}
