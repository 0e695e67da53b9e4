//! This modules defines the common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// The number of items per page when the request does not specify a valid page size.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// A normalized page request.
///
/// `page` is at least 1 and `page_size` is in `[1, max_page_size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// The 1-based page number.
    pub page: u64,
    /// The maximum number of items on a page.
    pub page_size: u64,
}

impl Pagination {
    /// Normalize the requested page and page size.
    ///
    /// A missing page or a page less than 1 becomes page 1. A missing page
    /// size or one outside `[1, config.max_page_size]` becomes
    /// `config.default_page_size`.
    pub fn new(page: Option<i64>, page_size: Option<i64>, config: &PaginationConfig) -> Self {
        let page = match page {
            Some(page) if page >= 1 => page as u64,
            _ => 1,
        };

        let page_size = match page_size {
            Some(size) if size >= 1 && (size as u64) <= config.max_page_size => size as u64,
            _ => config.default_page_size,
        };

        Self { page, page_size }
    }

    /// The number of items to skip before the start of the page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// Metadata describing where a page sits in the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// The number of items across all pages.
    pub total_count: u64,
    /// The number of pages needed to show every item.
    pub total_pages: u64,
    /// The 1-based number of the page that was returned.
    pub current_page: u64,
}

impl PageInfo {
    /// Compute the page metadata for `total_count` items paged with `pagination`.
    pub fn new(total_count: u64, pagination: Pagination) -> Self {
        Self {
            total_count,
            total_pages: total_count.div_ceil(pagination.page_size),
            current_page: pagination.page,
        }
    }
}
