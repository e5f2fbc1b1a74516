//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::form::{FormErrors, Notification};
use crate::query::{format_date, Page, SearchQuery};
use crate::task::{Priority, PriorityBadge, Task};
use crate::util::MISSING_DATE;

/// Request to create a task. Empty strings mean "not set".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    /// Task name (required, clamped to 255 characters)
    #[serde(default)]
    pub name: String,

    /// Optional ISO start date
    #[serde(default)]
    pub start_date: Option<String>,

    /// Optional ISO end date
    #[serde(default)]
    pub end_date: Option<String>,

    /// `low`, `normal` or `high`; empty means no priority chosen
    #[serde(default)]
    pub priority: Option<String>,
}

/// Response after creating a task.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskResponse {
    pub task: Task,
    pub notification: Notification,
}

/// One row of the task table.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRow {
    pub id: u64,
    pub name: String,
    /// ISO date, or a dash when missing
    pub start_date: String,
    /// ISO date, or a dash when missing
    pub end_date: String,
    pub priority: Priority,
    pub badge: PriorityBadge,
}

impl From<Task> for TaskRow {
    fn from(task: Task) -> Self {
        let show = |date: Option<chrono::NaiveDate>| {
            date.map(format_date)
                .unwrap_or_else(|| MISSING_DATE.to_string())
        };
        Self {
            id: task.id().as_u64(),
            name: task.name().to_string(),
            start_date: show(task.start_date()),
            end_date: show(task.end_date()),
            priority: task.priority(),
            badge: task.priority().badge(),
        }
    }
}

/// One page of the task list plus everything needed to render its controls.
#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskRow>,
    pub page: u32,
    pub total_pages: u32,
    pub total_count: usize,
    pub page_size: usize,
    /// e.g. `"11 - 20 of 25"`
    pub range_text: String,
    /// Pagination footer is shown only when something matched
    pub show_pagination: bool,
    /// Previous/next buttons are shown only for more than one page
    pub show_page_controls: bool,
    /// Canonical query string of this page
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_query: Option<String>,
    /// The "No tasks found" outcome
    pub no_results: bool,
    /// Sequence number of the lookup that produced this page
    pub stamp: u64,
}

impl TaskListResponse {
    pub fn new(query: &SearchQuery, page: Page<Task>, stamp: u64) -> Self {
        // Past the end, "previous" jumps back to the last real page.
        let previous_page = if page.current_page > page.total_pages {
            page.total_pages
        } else {
            page.current_page.saturating_sub(1)
        };
        let previous_query = page
            .has_previous()
            .then(|| query.with_page(previous_page).to_query_string());
        let next_query = page
            .has_next()
            .then(|| query.with_page(page.current_page + 1).to_query_string());

        let page = page.map(TaskRow::from);
        Self {
            page: page.current_page,
            total_pages: page.total_pages,
            total_count: page.total_count,
            page_size: page.page_size,
            range_text: page.range_text(),
            show_pagination: page.total_count > 0,
            show_page_controls: page.show_controls(),
            query: query.to_query_string(),
            previous_query,
            next_query,
            no_results: page.items.is_empty(),
            stamp,
            tasks: page.items,
        }
    }
}

/// A selectable priority.
#[derive(Debug, Clone, Serialize)]
pub struct PriorityOption {
    pub label: &'static str,
    pub value: Priority,
}

/// Error body. `errors` carries per-field validation messages.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FormErrors>,
}

impl ErrorResponse {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            errors: None,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Number of tasks served
    pub task_count: usize,
}
