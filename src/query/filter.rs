//! Criteria evaluation over a task collection.

use crate::task::Task;

use super::criteria::FilterCriteria;

/// Tasks satisfying every set criterion, in input order.
///
/// # Properties
/// - Pure: `all` is only read
/// - Stable: relative order of the input is preserved
/// - Idempotent: `filter_tasks(&filter_tasks(l, c), c) == filter_tasks(l, c)`
pub fn filter_tasks(all: &[Task], criteria: &FilterCriteria) -> Vec<Task> {
    if criteria.is_empty() {
        return all.to_vec();
    }
    all.iter()
        .filter(|task| criteria.matches(task))
        .cloned()
        .collect()
}
