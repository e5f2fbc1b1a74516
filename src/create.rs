//! Creation interface consumed by the task form.
//!
//! The creator receives an already validated [`NewTask`] and answers with the
//! stored record or a [`CreateError`]. A recoverable rejection sends the form
//! back to editing; an unavailable collaborator is fatal for this attempt.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::task::{NewTask, Task, TaskId, TaskProvider};

/// Why a creation attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateError {
    /// The collaborator refused this payload; the user can correct and retry.
    #[error("Task was rejected: {0}")]
    Rejected(String),

    /// The collaborator cannot be reached at all.
    #[error("Task service unavailable: {0}")]
    Unavailable(String),
}

impl CreateError {
    /// Whether the form should return to editing with the message shown.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CreateError::Rejected(_) => true,
            CreateError::Unavailable(_) => false,
        }
    }
}

/// Consumer of validated form data.
#[async_trait]
pub trait TaskCreator: Send + Sync {
    async fn create(&self, task: NewTask) -> Result<Task, CreateError>;
}

/// Stand-in for a real backend: waits, assigns an id, never persists.
///
/// Ids continue after the provider's highest id and keep increasing across
/// calls, but the provider's collection is never modified.
pub struct SimulatedCreator {
    provider: Arc<dyn TaskProvider>,
    latency: Duration,
    last_issued: Mutex<Option<TaskId>>,
}

impl SimulatedCreator {
    pub fn new(provider: Arc<dyn TaskProvider>, latency: Duration) -> Self {
        Self {
            provider,
            latency,
            last_issued: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TaskCreator for SimulatedCreator {
    async fn create(&self, task: NewTask) -> Result<Task, CreateError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut last_issued = self.last_issued.lock().await;
        let base = match *last_issued {
            Some(id) => Some(id),
            None => self.provider.max_id().await,
        };
        let id = base.map(|id| id.next()).unwrap_or_else(|| TaskId::new(1));
        *last_issued = Some(id);

        tracing::debug!(task_id = %id, name = %task.name, "Simulated task creation");
        Ok(task.into_task(id))
    }
}
