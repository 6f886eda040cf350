//! Client-side mirror of the signed-in user's tasks

use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use taskdeck_auth::{FetchError, SessionManager};
use tokio::sync::{broadcast, Mutex as AsyncMutex};

use crate::api::TasksApi;
use crate::error::TaskError;
use crate::filter::{TaskFilter, TaskStats};
use crate::models::{NewTask, Task, TaskUpdate};

/// What happened to the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorChange {
    Replaced,
    Inserted(i64),
    Updated(i64),
    Removed(i64),
    Cleared,
}

/// Tasks together with the session token they were loaded under
#[derive(Default)]
struct Mirror {
    owner: Option<String>,
    tasks: Vec<Task>,
}

/// Keeps an in-memory copy of the task collection in step with the server.
///
/// Changes are applied only after the server acknowledges them, so a failed
/// call never leaves the mirror ahead of the server. Mutations addressing the
/// same task id run one at a time, in the order they were issued.
///
/// The mirror belongs to the session it was loaded under. Once the session
/// ends or switches to another token the old tasks are dropped, and late
/// responses for the previous token are discarded.
pub struct TaskSync {
    api: TasksApi,
    session: Arc<SessionManager>,
    mirror: RwLock<Mirror>,
    locks: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
    changes: broadcast::Sender<MirrorChange>,
}

impl TaskSync {
    pub fn new(api: TasksApi, session: Arc<SessionManager>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            api,
            session,
            mirror: RwLock::new(Mirror::default()),
            locks: Mutex::new(HashMap::new()),
            changes,
        }
    }

    /// Receive a notification after every change to the mirror
    pub fn subscribe(&self) -> broadcast::Receiver<MirrorChange> {
        self.changes.subscribe()
    }

    /// Snapshot of the mirror, in server order
    pub fn tasks(&self) -> Vec<Task> {
        self.read(|tasks| tasks.to_vec())
    }

    pub fn task(&self, id: i64) -> Option<Task> {
        self.read(|tasks| tasks.iter().find(|t| t.id == id).cloned())
    }

    pub fn filtered(&self, filter: TaskFilter) -> Vec<Task> {
        self.read(|tasks| filter.apply(tasks))
    }

    pub fn stats(&self) -> TaskStats {
        self.read(TaskStats::from_tasks)
    }

    /// Forget every task, e.g. when the user signs out
    pub fn clear(&self) {
        {
            let mut mirror = self.mirror.write().unwrap_or_else(|e| e.into_inner());
            mirror.tasks.clear();
            mirror.owner = None;
        }
        self.notify(MirrorChange::Cleared);
    }

    /// Drop the mirror if it was loaded under a session that is no longer
    /// current. Returns whether anything was dropped.
    pub fn sync_session(&self) -> bool {
        let current = self.session_token();
        let dropped = {
            let mut mirror = self.mirror.write().unwrap_or_else(|e| e.into_inner());
            if mirror.owner == current {
                return false;
            }
            mirror.owner = current;
            let had_tasks = !mirror.tasks.is_empty();
            mirror.tasks.clear();
            had_tasks
        };

        if dropped {
            debug!("Session changed, dropping mirrored tasks");
            self.notify(MirrorChange::Cleared);
        }
        dropped
    }

    /// Fetch the full collection and replace the mirror with it
    pub async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        let token = self.token()?;
        let tasks = match self.api.list(&token).await {
            Ok(tasks) => tasks,
            Err(e) => return Err(self.failed(&token, e).await),
        };

        info!("Loaded {} tasks", tasks.len());
        let replaced = self.write(&token, |mirror| *mirror = tasks.clone());
        if replaced.is_some() {
            self.notify(MirrorChange::Replaced);
        }
        Ok(tasks)
    }

    /// Fetch one task and insert or refresh it in the mirror
    pub async fn get_task(&self, id: i64) -> Result<Task, TaskError> {
        let token = self.token()?;
        let lock = self.task_lock(id);
        let result = {
            let _guard = lock.lock().await;
            match self.api.get(&token, id).await {
                Ok(task) => {
                    self.upsert(&token, task.clone());
                    Ok(task)
                }
                Err(e) => Err(self.failed(&token, e).await),
            }
        };
        self.release_task_lock(id, lock);
        result
    }

    /// Validate locally, create on the server, then append the server's task
    pub async fn create_task(&self, task: NewTask) -> Result<Task, TaskError> {
        let body = task.validated()?;
        let token = self.token()?;

        let created = match self.api.create(&token, &body).await {
            Ok(created) => created,
            Err(e) => return Err(self.failed(&token, e).await),
        };

        debug!("Created task {}", created.id);
        self.upsert(&token, created.clone());
        Ok(created)
    }

    /// Send a partial update and merge the server's answer into the mirror
    pub async fn update_task(&self, id: i64, update: TaskUpdate) -> Result<Task, TaskError> {
        let update = update.validated()?;
        let token = self.token()?;

        let lock = self.task_lock(id);
        let result = {
            let _guard = lock.lock().await;
            self.send_update(&token, id, &update).await
        };
        self.release_task_lock(id, lock);
        result
    }

    /// Flip completion: stamp `completed_at` when completing, clear it otherwise
    pub async fn toggle_completion(&self, id: i64) -> Result<Task, TaskError> {
        let token = self.token()?;

        let lock = self.task_lock(id);
        let result = {
            let _guard = lock.lock().await;
            match self.task(id) {
                Some(current) => {
                    let update = TaskUpdate::new().completion(!current.is_completed, Utc::now());
                    self.send_update(&token, id, &update).await
                }
                None => Err(TaskError::NotFound(id)),
            }
        };
        self.release_task_lock(id, lock);
        result
    }

    /// Delete on the server; the mirror drops the task only once that succeeds
    pub async fn delete_task(&self, id: i64) -> Result<(), TaskError> {
        let token = self.token()?;

        let lock = self.task_lock(id);
        let result = {
            let _guard = lock.lock().await;
            match self.api.delete(&token, id).await {
                Ok(()) => {
                    let removed = self.write(&token, |mirror| {
                        let before = mirror.len();
                        mirror.retain(|t| t.id != id);
                        mirror.len() != before
                    });
                    if removed == Some(true) {
                        self.notify(MirrorChange::Removed(id));
                    }
                    debug!("Deleted task {}", id);
                    Ok(())
                }
                Err(e) => Err(self.failed(&token, e).await),
            }
        };
        self.release_task_lock(id, lock);
        result
    }

    async fn send_update(
        &self,
        token: &str,
        id: i64,
        update: &TaskUpdate,
    ) -> Result<Task, TaskError> {
        let updated = match self.api.update(token, id, update).await {
            Ok(task) => task,
            Err(e) => return Err(self.failed(token, e).await),
        };

        let merged = self.write(token, |mirror| {
            match mirror.iter_mut().find(|t| t.id == id) {
                Some(slot) => {
                    *slot = updated.clone();
                    true
                }
                None => false,
            }
        });

        if merged == Some(true) {
            self.notify(MirrorChange::Updated(id));
        } else {
            debug!("Task {} is no longer mirrored, not merging update", id);
        }
        Ok(updated)
    }

    fn upsert(&self, token: &str, task: Task) {
        let id = task.id;
        let change = self.write(token, |mirror| match mirror.iter_mut().find(|t| t.id == id) {
            Some(slot) => {
                *slot = task;
                MirrorChange::Updated(id)
            }
            None => {
                mirror.push(task);
                MirrorChange::Inserted(id)
            }
        });
        if let Some(change) = change {
            self.notify(change);
        }
    }

    /// Read the tasks of the current session, dropping any left over from
    /// an earlier one first
    fn read<R>(&self, f: impl FnOnce(&[Task]) -> R) -> R {
        self.sync_session();
        let mirror = self.mirror.read().unwrap_or_else(|e| e.into_inner());
        if mirror.owner.is_some() && mirror.owner == self.session_token() {
            f(&mirror.tasks)
        } else {
            f(&[])
        }
    }

    /// Apply a server answer obtained with `token`.
    ///
    /// Returns `None` without touching the mirror when `token` is no longer
    /// the session's token.
    fn write<R>(&self, token: &str, f: impl FnOnce(&mut Vec<Task>) -> R) -> Option<R> {
        self.sync_session();
        let mut mirror = self.mirror.write().unwrap_or_else(|e| e.into_inner());
        if mirror.owner.as_deref() != Some(token) {
            debug!("Discarding a response for a previous session");
            return None;
        }
        Some(f(&mut mirror.tasks))
    }

    fn session_token(&self) -> Option<String> {
        let session = self.session.session();
        if session.is_authenticated() {
            session.token
        } else {
            None
        }
    }

    fn token(&self) -> Result<String, TaskError> {
        self.session_token().ok_or(TaskError::NotAuthenticated)
    }

    /// A 401 means the token is no longer good: sign out and drop the mirror
    async fn failed(&self, token: &str, err: FetchError) -> TaskError {
        if err.is_unauthorized() {
            if self.session.invalidate(token).await {
                warn!("Task request was unauthorized, session ended");
                self.clear();
            } else {
                debug!("Unauthorized response for a previous session");
            }
        } else {
            warn!("Task request failed: {}", err);
        }
        TaskError::Fetch(err)
    }

    fn task_lock(&self, id: i64) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(id).or_default().clone()
    }

    fn release_task_lock(&self, id: i64, lock: Arc<AsyncMutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        drop(lock);
        if locks.get(&id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&id);
        }
    }

    fn notify(&self, change: MirrorChange) {
        // No receivers is fine
        let _ = self.changes.send(change);
    }
}
