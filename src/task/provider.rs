//! Read-only task data providers.
//!
//! The search engine never holds a global dataset; it asks an injected
//! [`TaskProvider`] for the full ordered collection and filters locally.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::task::{Task, TaskId};

/// Demo dataset shipped with the binary.
const DEMO_TASKS: &str = include_str!("demo_tasks.json");

/// Errors raised while loading a task collection.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Failed to read task file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid task data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate task id {0}")]
    DuplicateId(TaskId),
}

/// Source of the full, ordered task collection.
#[async_trait]
pub trait TaskProvider: Send + Sync {
    /// Every task, in display order.
    async fn all_tasks(&self) -> Vec<Task>;

    /// Highest id currently in the collection, if any.
    async fn max_id(&self) -> Option<TaskId> {
        self.all_tasks().await.iter().map(Task::id).max()
    }
}

/// Fixed in-memory collection.
#[derive(Debug, Clone)]
pub struct InMemoryTaskProvider {
    tasks: Arc<[Task]>,
}

impl InMemoryTaskProvider {
    /// Wrap an existing collection.
    ///
    /// # Errors
    /// Returns `ProviderError::DuplicateId` if two tasks share an id.
    pub fn new(tasks: Vec<Task>) -> Result<Self, ProviderError> {
        let mut seen = HashSet::with_capacity(tasks.len());
        for task in &tasks {
            if !seen.insert(task.id()) {
                return Err(ProviderError::DuplicateId(task.id()));
            }
        }
        Ok(Self {
            tasks: tasks.into(),
        })
    }

    /// The built-in demo dataset.
    pub fn seeded() -> Result<Self, ProviderError> {
        Self::from_json_str(DEMO_TASKS)
    }

    /// Parse a JSON array of tasks.
    pub fn from_json_str(json: &str) -> Result<Self, ProviderError> {
        let tasks: Vec<Task> = serde_json::from_str(json)?;
        Self::new(tasks)
    }

    /// Load a JSON fixture from disk.
    pub async fn from_json_file(path: &Path) -> Result<Self, ProviderError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ProviderError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_json_str(&contents)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[async_trait]
impl TaskProvider for InMemoryTaskProvider {
    async fn all_tasks(&self) -> Vec<Task> {
        self.tasks.to_vec()
    }

    async fn max_id(&self) -> Option<TaskId> {
        self.tasks.iter().map(Task::id).max()
    }
}
