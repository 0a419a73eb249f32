//! Registry of background transfer tasks
//!
//! Uploads and remote deletes run as spawned Tokio tasks. The registry keeps an
//! abort handle for each so outstanding work can be stopped on shutdown.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

/// Unique identifier for a tracked task
pub type TaskId = u64;

/// Information about an active task
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: TaskId,
    /// e.g. `upload cat.png`
    pub name: String,
    pub created_at: Instant,
}

struct TaskEntry {
    info: TaskInfo,
    abort_handle: AbortHandle,
}

#[derive(Clone, Default)]
pub struct TaskRegistry {
    next_id: Arc<AtomicU64>,
    tasks: Arc<Mutex<HashMap<TaskId, TaskEntry>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        TaskRegistry::default()
    }

    fn generate_id(&self) -> TaskId {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Spawn a task that removes itself from the registry when it finishes
    pub async fn spawn_tracked<F>(&self, name: impl Into<String>, future: F) -> TaskId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.generate_id();
        let tasks_cleanup = self.tasks.clone();
        // hold the lock so a fast task cannot clean up before it is registered
        let mut tasks = self.tasks.lock().await;

        let join_handle = tokio::spawn(async move {
            future.await;
            tasks_cleanup.lock().await.remove(&id);
        });

        tasks.insert(
            id,
            TaskEntry {
                info: TaskInfo {
                    id,
                    name: name.into(),
                    created_at: Instant::now(),
                },
                abort_handle: join_handle.abort_handle(),
            },
        );
        id
    }

    pub async fn active_tasks(&self) -> Vec<TaskInfo> {
        let tasks = self.tasks.lock().await;
        tasks.values().map(|e| e.info.clone()).collect()
    }

    pub async fn active_count(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Abort every outstanding task, returns how many were aborted
    pub async fn cancel_all(&self) -> usize {
        let mut tasks = self.tasks.lock().await;
        let count = tasks.len();
        for entry in tasks.values() {
            tracing::debug!("Aborting task {} ({})", entry.info.id, entry.info.name);
            entry.abort_handle.abort();
        }
        tasks.clear();
        count
    }
}
