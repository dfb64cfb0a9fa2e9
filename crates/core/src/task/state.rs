//! In-memory task state
//!
//! Holds the synchronized task collection plus derived statistics. The
//! collection is mutated only through repository results, so local input
//! never becomes truth without a server round trip.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::model::{Task, TaskDraft, TaskPatch, TaskStats};
use super::repository::TaskRepository;
use crate::{Error, Result};

/// Change notification sent to observers after each completed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// The collection was replaced wholesale.
    Refreshed,
    Added(String),
    Updated(String),
    Removed(String),
    /// An operation failed; the recorded error changed.
    Failed,
}

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    error: Option<Error>,
    /// Monotonic ticket for in-flight refreshes; stale responses lose.
    refresh_seq: u64,
}

/// Container for the local task view.
///
/// Cloneable handle over shared state. Each operation applies its result in
/// a single write-lock section, so observers see either the pre- or
/// post-operation snapshot, never an intermediate one. Concurrent mutations
/// of the same task are last-writer-wins. At most one error is kept: each
/// operation's outcome replaces it, and a success clears it.
#[derive(Clone)]
pub struct TaskState {
    repo: Arc<dyn TaskRepository>,
    state: Arc<RwLock<State>>,
    change_tx: broadcast::Sender<StateChange>,
}

impl TaskState {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        let (change_tx, _) = broadcast::channel(64);
        Self {
            repo,
            state: Arc::new(RwLock::new(State::default())),
            change_tx,
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.change_tx.subscribe()
    }

    /// Snapshot of the current collection.
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    /// The failure recorded by the most recent operation, if any.
    pub async fn error(&self) -> Option<Error> {
        self.state.read().await.error.clone()
    }

    /// Statistics derived from the current collection.
    pub async fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.state.read().await.tasks)
    }

    /// Replace the local collection with the server's task list.
    ///
    /// If a newer refresh was issued while this one was in flight, the
    /// response is discarded so it cannot overwrite fresher data.
    pub async fn refresh(&self) -> Result<()> {
        let ticket = {
            let mut state = self.state.write().await;
            state.refresh_seq += 1;
            state.refresh_seq
        };

        let result = self.repo.list().await;

        let mut state = self.state.write().await;
        if state.refresh_seq != ticket {
            debug!("Discarding stale refresh response");
            return Ok(());
        }
        match result {
            Ok(tasks) => {
                debug!("Refreshed {} tasks", tasks.len());
                state.tasks = tasks;
                state.error = None;
                drop(state);
                self.notify(StateChange::Refreshed);
                Ok(())
            }
            Err(error) => {
                state.error = Some(error.clone());
                drop(state);
                self.notify(StateChange::Failed);
                Err(error)
            }
        }
    }

    /// Create a task and append the server's canonical record.
    pub async fn add(&self, draft: TaskDraft) -> Result<Task> {
        match self.repo.create(draft).await {
            Ok(task) => {
                let mut state = self.state.write().await;
                state.tasks.push(task.clone());
                state.error = None;
                drop(state);
                self.notify(StateChange::Added(task.id.clone()));
                Ok(task)
            }
            Err(error) => {
                self.record_failure(error.clone()).await;
                Err(error)
            }
        }
    }

    /// Update a task in place with the server's canonical record.
    pub async fn edit(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        match self.repo.update(id, patch).await {
            Ok(task) => {
                let mut state = self.state.write().await;
                if let Some(entry) = state.tasks.iter_mut().find(|t| t.id == task.id) {
                    *entry = task.clone();
                }
                state.error = None;
                drop(state);
                self.notify(StateChange::Updated(task.id.clone()));
                Ok(task)
            }
            Err(error) => {
                self.record_failure(error.clone()).await;
                Err(error)
            }
        }
    }

    /// Delete a task and drop it from the local collection.
    pub async fn remove(&self, id: &str) -> Result<()> {
        match self.repo.delete(id).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                state.tasks.retain(|t| t.id != id);
                state.error = None;
                drop(state);
                self.notify(StateChange::Removed(id.to_string()));
                Ok(())
            }
            Err(error) => {
                self.record_failure(error.clone()).await;
                Err(error)
            }
        }
    }

    async fn record_failure(&self, error: Error) {
        self.state.write().await.error = Some(error);
        self.notify(StateChange::Failed);
    }

    fn notify(&self, change: StateChange) {
        // Nobody listening is fine; pages subscribe when they render.
        let _ = self.change_tx.send(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::model::TaskStatus;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    fn task(id: &str, status: Option<TaskStatus>) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: String::new(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status,
        }
    }

    fn draft() -> TaskDraft {
        TaskDraft::new("T", "D", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    /// Repository returning scripted results, with a per-call delay on
    /// `list` to exercise in-flight ordering.
    #[derive(Default)]
    struct ScriptedRepo {
        lists: Mutex<VecDeque<(u64, Result<Vec<Task>>)>>,
        creates: Mutex<VecDeque<Result<Task>>>,
        updates: Mutex<VecDeque<Result<Task>>>,
        deletes: Mutex<VecDeque<Result<()>>>,
    }

    impl ScriptedRepo {
        fn push_list(&self, delay_ms: u64, result: Result<Vec<Task>>) {
            self.lists.lock().unwrap().push_back((delay_ms, result));
        }
    }

    #[async_trait]
    impl TaskRepository for ScriptedRepo {
        async fn list(&self) -> Result<Vec<Task>> {
            let (delay_ms, result) = self
                .lists
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted list call");
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            result
        }

        async fn get(&self, id: &str) -> Result<Task> {
            Err(Error::NotFound(format!("task {id} not found")))
        }

        async fn create(&self, _draft: TaskDraft) -> Result<Task> {
            self.creates
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted create call")
        }

        async fn update(&self, _id: &str, _patch: TaskPatch) -> Result<Task> {
            self.updates
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted update call")
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            self.deletes
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted delete call")
        }
    }

    fn scripted() -> (Arc<ScriptedRepo>, TaskState) {
        let repo = Arc::new(ScriptedRepo::default());
        let state = TaskState::new(Arc::clone(&repo) as Arc<dyn TaskRepository>);
        (repo, state)
    }

    #[tokio::test]
    async fn test_refresh_replaces_collection_and_recomputes_stats() {
        let (repo, state) = scripted();
        repo.push_list(
            0,
            Ok(vec![
                task("1", Some(TaskStatus::Completed)),
                task("2", Some(TaskStatus::Pending)),
                task("3", None),
            ]),
        );

        state.refresh().await.unwrap();

        let stats = state.stats().await;
        assert_eq!(stats.total, state.tasks().await.len());
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.not_started, 1);
        assert_eq!(
            stats.completed + stats.pending + stats.in_progress + stats.not_started,
            stats.total
        );
        assert_eq!(state.error().await, None);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_collection() {
        let (repo, state) = scripted();
        repo.push_list(0, Ok(vec![task("1", None), task("2", None)]));
        repo.push_list(0, Err(Error::Network("connection refused".to_string())));
        repo.push_list(0, Ok(vec![task("3", None)]));

        state.refresh().await.unwrap();
        let before = state.tasks().await;

        let err = state.refresh().await.unwrap_err();
        assert_eq!(err, Error::Network("connection refused".to_string()));
        assert_eq!(state.tasks().await, before);
        assert_eq!(state.error().await, Some(err));

        // A later success clears the recorded error.
        state.refresh().await.unwrap();
        assert_eq!(state.error().await, None);
    }

    #[tokio::test]
    async fn test_add_appends_canonical_record_not_the_draft() {
        let (repo, state) = scripted();
        let canonical = Task {
            id: "99".to_string(),
            title: "T".to_string(),
            description: "D".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: None,
        };
        repo.creates
            .lock()
            .unwrap()
            .push_back(Ok(canonical.clone()));

        state.add(draft()).await.unwrap();

        let tasks = state.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0], canonical);
    }

    #[tokio::test]
    async fn test_add_failure_leaves_collection_unchanged() {
        let (repo, state) = scripted();
        repo.push_list(0, Ok(vec![task("1", None)]));
        repo.creates
            .lock()
            .unwrap()
            .push_back(Err(Error::Validation("title must not be empty".to_string())));

        state.refresh().await.unwrap();
        let before = state.tasks().await;

        let err = state.add(draft()).await.unwrap_err();
        assert_eq!(state.tasks().await, before);
        assert_eq!(state.error().await, Some(err));
    }

    #[tokio::test]
    async fn test_remove_drops_only_the_matching_entry() {
        let (repo, state) = scripted();
        repo.push_list(0, Ok(vec![task("1", None), task("2", None)]));
        repo.deletes.lock().unwrap().push_back(Ok(()));

        state.refresh().await.unwrap();
        state.remove("2").await.unwrap();

        let tasks = state.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert!(tasks.iter().all(|t| t.id != "2"));
    }

    #[tokio::test]
    async fn test_remove_failure_leaves_collection_unchanged() {
        let (repo, state) = scripted();
        repo.push_list(0, Ok(vec![task("1", None), task("2", None)]));
        repo.deletes
            .lock()
            .unwrap()
            .push_back(Err(Error::NotFound("Task not found".to_string())));

        state.refresh().await.unwrap();
        let before = state.tasks().await;

        let err = state.remove("2").await.unwrap_err();
        assert_eq!(err, Error::NotFound("Task not found".to_string()));
        assert_eq!(state.tasks().await, before);
        assert_eq!(state.error().await, Some(err));
    }

    #[tokio::test]
    async fn test_edit_replaces_exactly_the_matching_entry() {
        let (repo, state) = scripted();
        repo.push_list(0, Ok(vec![task("1", None), task("2", None)]));
        let mut updated = task("2", Some(TaskStatus::Completed));
        updated.title = "Renamed".to_string();
        repo.updates.lock().unwrap().push_back(Ok(updated.clone()));

        state.refresh().await.unwrap();
        let untouched = state.tasks().await[0].clone();

        state
            .edit("2", TaskPatch::default().with_status(TaskStatus::Completed))
            .await
            .unwrap();

        let tasks = state.tasks().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0], untouched);
        assert_eq!(tasks[1], updated);
    }

    #[tokio::test]
    async fn test_stale_refresh_response_is_discarded() {
        let (repo, state) = scripted();
        repo.push_list(50, Ok(vec![task("old", None)]));
        repo.push_list(1, Ok(vec![task("new", None)]));

        let slow = state.clone();
        let fast = state.clone();
        tokio::join!(slow.refresh(), async {
            // Let the first refresh claim its ticket before superseding it.
            tokio::time::sleep(Duration::from_millis(10)).await;
            fast.refresh().await
        });

        let tasks = state.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "new");
    }

    #[tokio::test]
    async fn test_observers_are_notified_per_operation() {
        let (repo, state) = scripted();
        repo.push_list(0, Ok(vec![task("1", None)]));
        repo.deletes
            .lock()
            .unwrap()
            .push_back(Err(Error::NotFound("Task not found".to_string())));

        let mut changes = state.subscribe();

        state.refresh().await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), StateChange::Refreshed);

        let _ = state.remove("1").await;
        assert_eq!(changes.recv().await.unwrap(), StateChange::Failed);
    }
}
