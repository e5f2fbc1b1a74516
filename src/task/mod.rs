//! Task module - the task record, its priority, and where tasks come from.
//!
//! - All types use algebraic data types with exhaustive matching
//! - Records are immutable; nothing in the crate mutates a stored task
//! - Data access goes through the injected [`TaskProvider`] capability

pub mod task;
mod provider;

pub use provider::{InMemoryTaskProvider, ProviderError, TaskProvider};
pub use task::{BadgeColor, NewTask, Priority, PriorityBadge, Task, TaskId, UnknownPriority};
