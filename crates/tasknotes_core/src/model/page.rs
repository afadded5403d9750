//! Pagination envelope shared by all list use-cases.

use serde::Serialize;

/// Number of rows rendered per list page.
pub const PAGINATOR_ITEMS_PER_PAGE: u32 = 10;

/// Requested page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number, already normalized.
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Builds a request with the default page size.
    ///
    /// Page numbers below 1 are treated as the first page.
    pub fn new(page: u32) -> Self {
        Self::with_size(page, PAGINATOR_ITEMS_PER_PAGE)
    }

    pub fn with_size(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Row offset for `LIMIT ... OFFSET ...` queries.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One page of results plus the totals needed to render navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total_items,
        }
    }

    /// Number of pages; an empty result still has one (empty) page.
    pub fn page_count(&self) -> u32 {
        let per_page = u64::from(self.per_page.max(1));
        let count = self.total_items.div_ceil(per_page).max(1);
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    /// Maps items while keeping the page window.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, PageRequest, PAGINATOR_ITEMS_PER_PAGE};

    #[test]
    fn page_request_clamps_to_first_page() {
        let request = PageRequest::new(0);
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, PAGINATOR_ITEMS_PER_PAGE);
        assert_eq!(request.offset(), 0);
        assert_eq!(PageRequest::new(3).offset(), 20);
    }

    #[test]
    fn page_count_rounds_up_and_never_hits_zero() {
        let empty: Page<u8> = Page::new(Vec::new(), PageRequest::new(1), 0);
        assert_eq!(empty.page_count(), 1);
        assert!(!empty.has_next());

        let page: Page<u8> = Page::new(vec![1; 10], PageRequest::new(1), 21);
        assert_eq!(page.page_count(), 3);
        assert!(page.has_next());
        assert!(!page.has_previous());
    }
}
