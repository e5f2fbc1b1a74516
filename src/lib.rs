//! # Taskboard
//!
//! Task search, filtering and pagination, plus a validated task-creation form.
//!
//! This library provides:
//! - Filter criteria and page numbers that round-trip through query strings
//! - Latest-request-wins lookups over a read-only task collection
//! - A creation form state machine with per-field validation
//! - An HTTP API over both
//!
//! ## Request Flow
//!
//! ```text
//!   GET /api/tasks?name=..&priority=..&page=..
//!                │
//!                ▼
//!        ┌───────────────┐    stale?    ┌────────────┐
//!        │ SearchSession │ ───────────▶ │ Superseded │
//!        └───────┬───────┘              └────────────┘
//!                │ filter_tasks + paginate
//!                ▼
//!           Page<Task>
//! ```
//!
//! ## Modules
//! - `task`: Task model and the read-only task provider
//! - `query`: Filter criteria, query-string codec, filtering and pagination
//! - `search`: Sequenced lookups per client session
//! - `form`: Creation form state machine
//! - `create`: Creation interface and the simulated creator
//! - `api`: HTTP endpoints

pub mod api;
pub mod config;
pub mod create;
pub mod form;
pub mod query;
pub mod search;
pub mod task;
pub mod util;

pub use config::Config;
pub use form::{FormPhase, TaskForm};
pub use query::{FilterCriteria, Page, SearchQuery};
pub use task::{Priority, Task, TaskId};
