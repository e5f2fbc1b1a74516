//! Core Task record and its priority enumeration.
//!
//! # Invariants
//! - `id` is unique within a task collection and never changes
//! - Tasks are immutable once constructed; filtering and pagination only read them

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unique identifier for a task.
///
/// # Properties
/// - Unique within the collection served by a provider
/// - Immutable once created
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner integer.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one.
    pub fn next(&self) -> TaskId {
        TaskId(self.0.saturating_add(1))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority of a task.
///
/// Closed set: every consumer (filter, badge, validation) matches exhaustively,
/// so a new level cannot silently fall through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// All priorities in the order they are offered as options.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Normal, Priority::High];

    /// Wire value used in query strings and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }

    /// Human-readable option label.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
        }
    }

    /// Badge shown next to a task in listings.
    pub fn badge(&self) -> PriorityBadge {
        let color = match self {
            Priority::High => BadgeColor::Red,
            Priority::Normal => BadgeColor::Blue,
            Priority::Low => BadgeColor::Green,
        };
        PriorityBadge {
            label: self.as_str().to_uppercase(),
            color,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = UnknownPriority;

    /// Parse the exact wire value. Anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(UnknownPriority(other.to_string())),
        }
    }
}

/// A value outside `low | normal | high`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown priority: {0:?}")]
pub struct UnknownPriority(pub String);

/// Badge colour palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    Red,
    Blue,
    Green,
}

/// Label and colour for a priority badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityBadge {
    pub label: String,
    pub color: BadgeColor,
}

/// A named unit of work with optional start/end dates and a priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    priority: Priority,
}

impl Task {
    pub fn new(
        id: TaskId,
        name: impl Into<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        priority: Priority,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            start_date,
            end_date,
            priority,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

/// Validated payload for creating a task.
///
/// Only the form state machine builds these, after every rule has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub priority: Priority,
}

impl NewTask {
    /// Materialize the record under the given id.
    pub fn into_task(self, id: TaskId) -> Task {
        Task::new(id, self.name, self.start_date, self.end_date, self.priority)
    }
}
