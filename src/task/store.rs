use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::model::Task;

/// Aggregate view of the store (history header)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub count: usize,
    pub total_duration_secs: u64,
}

/// Append-only, in-memory collection of submitted tasks
///
/// Cloning shares the same collection. Appends are serialized behind the
/// write lock so every task is counted exactly once.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, task: Task) {
        let mut tasks = self.tasks.write().await;
        info!(
            "Storing task {} ({}, {}s)",
            task.id, task.task_type, task.duration_sec
        );
        tasks.push(task);
    }

    /// All tasks in insertion order
    pub async fn list(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Sum of `duration_sec` over all tasks
    pub async fn total_duration(&self) -> u64 {
        self.tasks
            .read()
            .await
            .iter()
            .map(|task| u64::from(task.duration_sec))
            .sum()
    }

    pub async fn summary(&self) -> TaskSummary {
        let tasks = self.tasks.read().await;
        TaskSummary {
            count: tasks.len(),
            total_duration_secs: tasks.iter().map(|task| u64::from(task.duration_sec)).sum(),
        }
    }
}
