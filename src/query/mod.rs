//! Query/filter engine and pagination slicer.
//!
//! ```text
//! query string ──► SearchQuery ──► filter_tasks ──► paginate ──► Page<Task>
//! ```
//!
//! Everything here is a pure function of its inputs.

pub mod criteria;
mod filter;
mod paginate;

pub use criteria::{format_date, parse_date, FilterCriteria, SearchQuery};
pub use filter::filter_tasks;
pub use paginate::{paginate, total_pages, Page, DEFAULT_PAGE_SIZE};
