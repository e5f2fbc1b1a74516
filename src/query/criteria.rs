//! Filter criteria and the query string they travel in.
//!
//! Parsing is total: a missing, empty or malformed parameter simply leaves the
//! corresponding criterion unset. Encoding omits unset criteria, so
//! `from_query_str(c.to_query_string()) == c` for every representable `c`.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use url::form_urlencoded;

use crate::task::{Priority, Task};

pub const NAME_PARAM: &str = "name";
pub const START_DATE_PARAM: &str = "start_date";
pub const END_DATE_PARAM: &str = "end_date";
pub const PRIORITY_PARAM: &str = "priority";
pub const PAGE_PARAM: &str = "page";

/// ISO calendar date, as produced by date inputs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO `YYYY-MM-DD` date, `None` for anything else.
///
/// The shape is checked first: chrono alone also accepts unpadded fields
/// and a leading sign.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if !is_iso_date_shape(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Exactly `DDDD-DD-DD`.
fn is_iso_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Render a date the way it is parsed.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Active filter predicates.
///
/// # Invariants
/// - `name`, when set, is trimmed and non-empty
/// - `name_folded` is always the lowercase form of `name`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip)]
    name_folded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
}

impl FilterCriteria {
    /// Criteria that match every task.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name substring. Blank input clears it.
    pub fn with_name(mut self, name: impl AsRef<str>) -> Self {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            self.name = None;
            self.name_folded = None;
        } else {
            self.name = Some(trimmed.to_string());
            self.name_folded = Some(trimmed.to_lowercase());
        }
        self
    }

    pub fn with_start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.start_date = date;
        self
    }

    pub fn with_end_date(mut self, date: Option<NaiveDate>) -> Self {
        self.end_date = date;
        self
    }

    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.priority.is_none()
    }

    /// Build criteria from named parameters.
    ///
    /// The first occurrence of a key decides its value. Unknown keys are ignored.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::from_map(&first_values(params))
    }

    /// Build criteria from a raw (URL-encoded) query string.
    pub fn from_query_str(query: &str) -> Self {
        Self::from_params(form_urlencoded::parse(strip_question_mark(query).as_bytes()))
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).map(String::as_str).unwrap_or("");
        Self::new()
            .with_name(get(NAME_PARAM))
            .with_start_date(parse_date(get(START_DATE_PARAM)))
            .with_end_date(parse_date(get(END_DATE_PARAM)))
            .with_priority(get(PRIORITY_PARAM).trim().parse().ok())
    }

    /// Set criteria as `(name, value)` pairs, in canonical order.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(4);
        if let Some(name) = &self.name {
            params.push((NAME_PARAM, name.clone()));
        }
        if let Some(date) = self.start_date {
            params.push((START_DATE_PARAM, format_date(date)));
        }
        if let Some(date) = self.end_date {
            params.push((END_DATE_PARAM, format_date(date)));
        }
        if let Some(priority) = self.priority {
            params.push((PRIORITY_PARAM, priority.as_str().to_string()));
        }
        params
    }

    /// URL-encoded form of the set criteria (empty string when none are set).
    pub fn to_query_string(&self) -> String {
        encode(self.to_params())
    }

    /// Whether `task` satisfies every set criterion.
    ///
    /// A task without a start (end) date is never excluded by the start (end)
    /// bound: missing data does not fail a range criterion.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(needle) = &self.name_folded {
            if !task.name().to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        if let (Some(bound), Some(start)) = (self.start_date, task.start_date()) {
            if start < bound {
                return false;
            }
        }

        if let (Some(bound), Some(end)) = (self.end_date, task.end_date()) {
            if end > bound {
                return false;
            }
        }

        match self.priority {
            Some(wanted) => task.priority() == wanted,
            None => true,
        }
    }
}

/// Criteria plus the requested page: everything the list view's address carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub criteria: FilterCriteria,
    /// 1-based page; `None` means the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl SearchQuery {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            page: None,
        }
    }

    /// Parse named parameters. Never fails.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let map = first_values(params);
        Self {
            criteria: FilterCriteria::from_map(&map),
            page: map.get(PAGE_PARAM).map(String::as_str).and_then(parse_page),
        }
    }

    /// Parse a raw (URL-encoded) query string. Never fails.
    pub fn from_query_str(query: &str) -> Self {
        Self::from_params(form_urlencoded::parse(strip_question_mark(query).as_bytes()))
    }

    /// Page to show, defaulting to 1.
    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// The same search pointed at another page. Non-positive pages drop the parameter.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            criteria: self.criteria.clone(),
            page: (page >= 1).then_some(page),
        }
    }

    /// The query a reset search form navigates to: nothing set.
    pub fn reset() -> Self {
        Self::default()
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = self.criteria.to_params();
        if let Some(page) = self.page {
            params.push((PAGE_PARAM, page.to_string()));
        }
        params
    }

    pub fn to_query_string(&self) -> String {
        encode(self.to_params())
    }
}

/// Positive integer, or `None`.
fn parse_page(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|page| *page >= 1)
}

fn first_values<I, K, V>(params: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut map = HashMap::new();
    for (key, value) in params {
        map.entry(key.as_ref().to_string())
            .or_insert_with(|| value.as_ref().to_string());
    }
    map
}

fn encode(params: Vec<(&'static str, String)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn strip_question_mark(query: &str) -> &str {
    query.strip_prefix('?').unwrap_or(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskId;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_parse_all_parameters() {
        let query = SearchQuery::from_query_str(
            "name=code&start_date=2025-05-01&end_date=2025-06-30&priority=low&page=2",
        );
        assert_eq!(query.criteria.name(), Some("code"));
        assert_eq!(query.criteria.start_date(), Some(date("2025-05-01")));
        assert_eq!(query.criteria.end_date(), Some(date("2025-06-30")));
        assert_eq!(query.criteria.priority(), Some(Priority::Low));
        assert_eq!(query.page, Some(2));
    }

    #[test]
    fn test_parse_date_requires_padded_iso_shape() {
        for value in ["2025-5-1", "2025-05-1", "+2025-05-01", "25-05-01", "2025/05/01"] {
            assert_eq!(parse_date(value), None, "{value:?} should not parse");
        }
        assert_eq!(parse_date(" 2025-05-01 "), Some(date("2025-05-01")));

        let query = SearchQuery::from_query_str("start_date=2025-5-1");
        assert_eq!(query.criteria.start_date(), None);
        assert_eq!(query.to_query_string(), "");
    }

    #[test]
    fn test_empty_and_missing_parameters_are_unset() {
        let query = SearchQuery::from_query_str("name=&start_date=&priority=");
        assert!(query.criteria.is_empty());
        assert_eq!(query.page_number(), 1);

        assert_eq!(SearchQuery::from_query_str(""), SearchQuery::default());
    }

    #[test]
    fn test_malformed_parameters_are_unset() {
        let query = SearchQuery::from_query_str(
            "start_date=2025-13-40&end_date=yesterday&priority=urgent&page=abc",
        );
        assert!(query.criteria.is_empty());
        assert_eq!(query.page, None);
    }

    #[test]
    fn test_non_positive_page_is_unset() {
        assert_eq!(SearchQuery::from_query_str("page=0").page, None);
        assert_eq!(SearchQuery::from_query_str("page=-3").page, None);
        assert_eq!(SearchQuery::from_query_str("page=3").page, Some(3));
    }

    #[test]
    fn test_name_is_trimmed_and_blank_is_unset() {
        let criteria = FilterCriteria::from_query_str("name=%20%20Code%20");
        assert_eq!(criteria.name(), Some("Code"));

        let blank = FilterCriteria::from_query_str("name=+++");
        assert_eq!(blank.name(), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let criteria = FilterCriteria::from_params([("priority", "high"), ("priority", "low")]);
        assert_eq!(criteria.priority(), Some(Priority::High));
    }

    #[test]
    fn test_leading_question_mark_is_accepted() {
        let criteria = FilterCriteria::from_query_str("?priority=normal");
        assert_eq!(criteria.priority(), Some(Priority::Normal));
    }

    #[test]
    fn test_encoding_omits_unset_fields() {
        let criteria = FilterCriteria::new()
            .with_name("write code")
            .with_priority(Some(Priority::High));
        assert_eq!(criteria.to_query_string(), "name=write+code&priority=high");
        assert_eq!(FilterCriteria::new().to_query_string(), "");
    }

    #[test]
    fn test_round_trip_with_special_characters() {
        let criteria = FilterCriteria::new()
            .with_name("R&D: 50% done?")
            .with_start_date(Some(date("2025-01-31")))
            .with_end_date(Some(date("2025-02-01")));
        let encoded = criteria.to_query_string();
        assert_eq!(FilterCriteria::from_query_str(&encoded), criteria);
    }

    #[test]
    fn test_with_page_keeps_criteria() {
        let query = SearchQuery::from_query_str("name=code&priority=low");
        let next = query.with_page(3);
        assert_eq!(next.to_query_string(), "name=code&priority=low&page=3");
        assert_eq!(query.with_page(0).page, None);
    }

    #[test]
    fn test_reset_clears_everything() {
        assert_eq!(SearchQuery::reset().to_query_string(), "");
    }

    #[test]
    fn test_matches_name_case_insensitively() {
        let task = Task::new(TaskId::new(1), "Write Code", None, None, Priority::High);
        assert!(FilterCriteria::new().with_name("CODE").matches(&task));
        assert!(FilterCriteria::new().with_name("te co").matches(&task));
        assert!(!FilterCriteria::new().with_name("review").matches(&task));
    }

    #[test]
    fn test_missing_task_dates_pass_range_bounds() {
        let undated = Task::new(TaskId::new(1), "Undated", None, None, Priority::Low);
        let criteria = FilterCriteria::new()
            .with_start_date(Some(date("2030-01-01")))
            .with_end_date(Some(date("2000-01-01")));
        assert!(criteria.matches(&undated));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let task = Task::new(
            TaskId::new(1),
            "Edge",
            Some(date("2025-05-01")),
            Some(date("2025-05-10")),
            Priority::Normal,
        );
        let criteria = FilterCriteria::new()
            .with_start_date(Some(date("2025-05-01")))
            .with_end_date(Some(date("2025-05-10")));
        assert!(criteria.matches(&task));

        let later = FilterCriteria::new().with_start_date(Some(date("2025-05-02")));
        assert!(!later.matches(&task));
        let earlier = FilterCriteria::new().with_end_date(Some(date("2025-05-09")));
        assert!(!earlier.matches(&task));
    }
}
