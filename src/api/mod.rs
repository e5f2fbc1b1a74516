//! HTTP API for the task board.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/priorities` - Selectable priorities
//! - `GET /api/tasks` - Search, filter and paginate tasks (`name`, `start_date`,
//!   `end_date`, `priority`, `page`; optional `x-session-id` header)
//! - `POST /api/tasks` - Validate and create a task

mod routes;
pub mod tasks;
pub mod types;

pub use routes::{router, serve, AppState};
pub use types::*;
