//! Page slicing over a filtered list.
//!
//! # Invariants
//! - Slice bounds always stay within `[0, total_count]`
//! - `total_pages >= 1`, even for an empty list
//! - A page past the end is an empty slice, never an error
//!
//! Range policy (clamping a requested page to `total_pages`, or jumping back to
//! page 1 when criteria change) belongs to the caller.

use serde::Serialize;

/// Rows per page in the task list.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page window over a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Index of the first item of this page within the full list.
    fn offset(&self) -> usize {
        (self.current_page.saturating_sub(1) as usize).saturating_mul(self.page_size)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Page navigation is only worth showing for more than one page.
    pub fn show_controls(&self) -> bool {
        self.total_pages > 1
    }

    /// `"{first} - {last} of {total}"`, 1-based. `"0 - 0 of {total}"` when the page is empty.
    pub fn range_text(&self) -> String {
        if self.items.is_empty() {
            return format!("0 - 0 of {}", self.total_count);
        }
        let first = self.offset() + 1;
        let last = self.offset() + self.items.len();
        format!("{} - {} of {}", first, last, self.total_count)
    }

    /// Transform the items, keeping the window.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_count: self.total_count,
            page_size: self.page_size,
        }
    }
}

/// Number of pages needed for `count` items; at least 1.
pub fn total_pages(count: usize, page_size: usize) -> u32 {
    let page_size = page_size.max(1);
    let pages = count.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Slice `items` for the 1-based `page`.
///
/// `page == 0` is read as page 1 and `page_size == 0` as 1. Pages past the end
/// yield an empty slice.
///
/// # Postconditions
/// - `result.items.len() == min(page_size, len - (page - 1) * page_size)` for in-range pages
/// - concatenating pages `1..=total_pages` reproduces `items`
pub fn paginate<T: Clone>(items: &[T], page: u32, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_count = items.len();

    let start = (page as usize - 1).saturating_mul(page_size).min(total_count);
    let end = start.saturating_add(page_size).min(total_count);

    Page {
        items: items[start..end].to_vec(),
        current_page: page,
        total_pages: total_pages(total_count, page_size),
        total_count,
        page_size,
    }
}
