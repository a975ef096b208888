//! Pagination utilities for blacklist and history listings

use serde::Serialize;

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: i64 = 500;

/// Requested page (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Rows per page after clamping
    pub page_size: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

/// One page of rows plus its metadata
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// Calculate pagination metadata from total results and requested page
///
/// Page size is clamped to [1, MAX_PAGE_SIZE] and the page to
/// [1, total_pages].
///
/// # Examples
/// ```
/// use bazarr_common::pagination::{calculate_pagination, PageRequest};
///
/// // 60 results at 25 per page = 3 pages (25 + 25 + 10)
/// let p = calculate_pagination(60, PageRequest::new(2, 25));
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 25);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(60, PageRequest::new(99, 25));
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 50);
/// ```
pub fn calculate_pagination(total_results: i64, request: PageRequest) -> Pagination {
    let page_size = request.page_size.clamp(1, MAX_PAGE_SIZE);
    let total_pages = (total_results + page_size - 1) / page_size;
    let page = request.page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        page_size,
        total_pages,
        offset,
    }
}
