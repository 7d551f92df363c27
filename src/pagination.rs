//! This modules defines the common functionality for paging data.

use serde::Serialize;

/// The config for pagination
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    /// The page number to default to when not specified.
    pub default_page: u64,
    /// The maximum items to show per page when not specified.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// At most `per_page` items.
    pub items: Vec<T>,
    /// The size of the whole result set, independent of the page.
    pub total: usize,
    pub page: u64,
    pub per_page: u64,
    /// The number of pages, at least one even when there are no items.
    pub last_page: u64,
}

/// Slice `items` into the 1-based page `page` of `per_page` items.
///
/// A page or page size of zero is treated as one. Requesting a page past the
/// last page yields an empty page rather than an error.
pub fn paginate<T: Clone>(items: &[T], page: u64, per_page: u64) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total = items.len();
    let last_page = (total as u64).div_ceil(per_page).max(1);

    let offset = (page - 1).saturating_mul(per_page);
    let page_items = usize::try_from(offset)
        .ok()
        .and_then(|offset| items.get(offset..))
        .map(|rest| {
            rest.iter()
                .take(usize::try_from(per_page).unwrap_or(usize::MAX))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    Page {
        items: page_items,
        total,
        page,
        per_page,
        last_page,
    }
}
