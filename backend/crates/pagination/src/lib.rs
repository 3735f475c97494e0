//! Page/limit pagination primitives shared by marketplace list endpoints.
//!
//! List endpoints accept a one-based `page` and a `limit`, clamp them against
//! per-endpoint [`PageLimits`], and answer with a [`Paginated`] payload that
//! carries the page metadata alongside the items.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Pages are one-based.
    #[error("page must be at least 1")]
    PageOutOfRange,
    /// The requested limit is zero or above the configured maximum.
    #[error("limit must be between 1 and {max}")]
    LimitOutOfRange {
        /// Largest accepted limit.
        max: u32,
    },
}

/// Default and maximum page sizes for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    default_limit: u32,
    max_limit: u32,
}

impl PageLimits {
    /// Build limits, widening `max_limit` to `default_limit` when needed.
    ///
    /// # Examples
    /// ```
    /// use pagination::PageLimits;
    ///
    /// let limits = PageLimits::new(12, 100);
    /// assert_eq!(limits.default_limit(), 12);
    /// assert_eq!(limits.max_limit(), 100);
    /// ```
    #[must_use]
    pub const fn new(default_limit: u32, max_limit: u32) -> Self {
        let default_limit = if default_limit == 0 { 1 } else { default_limit };
        let max_limit = if max_limit < default_limit {
            default_limit
        } else {
            max_limit
        };
        Self {
            default_limit,
            max_limit,
        }
    }

    /// Page size used when the caller omits `limit`.
    #[must_use]
    pub const fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Largest page size a caller may request.
    #[must_use]
    pub const fn max_limit(&self) -> u32 {
        self.max_limit
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::new(20, 100)
    }
}

/// Validated one-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a page request from optional caller input.
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when `page` is zero or `limit` falls
    /// outside `1..=limits.max_limit()`.
    ///
    /// # Examples
    /// ```
    /// use pagination::{PageLimits, PageRequest};
    ///
    /// let request = PageRequest::try_new(Some(3), None, PageLimits::new(10, 50)).unwrap();
    /// assert_eq!(request.offset(), 20);
    /// assert_eq!(request.limit(), 10);
    /// ```
    pub fn try_new(
        page: Option<u32>,
        limit: Option<u32>,
        limits: PageLimits,
    ) -> Result<Self, PageRequestError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(PageRequestError::PageOutOfRange);
        }
        let limit = limit.unwrap_or(limits.default_limit);
        if limit == 0 || limit > limits.max_limit {
            return Err(PageRequestError::LimitOutOfRange {
                max: limits.max_limit,
            });
        }
        Ok(Self { page, limit })
    }

    /// First page with the default limit.
    #[must_use]
    pub const fn first(limits: PageLimits) -> Self {
        Self {
            page: 1,
            limit: limits.default_limit,
        }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items to skip before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Page metadata returned next to the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// One-based page number.
    pub page: u32,
    /// Page size used for this response.
    pub limit: u32,
    /// Total number of matching items across all pages.
    pub total: u64,
    /// Total number of pages; zero when nothing matched.
    pub total_pages: u64,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
}

impl PageInfo {
    /// Compute page metadata for `request` over `total` matching items.
    ///
    /// # Examples
    /// ```
    /// use pagination::{PageInfo, PageLimits, PageRequest};
    ///
    /// let request = PageRequest::try_new(Some(2), Some(10), PageLimits::default()).unwrap();
    /// let info = PageInfo::new(request, 25);
    /// assert_eq!(info.total_pages, 3);
    /// assert!(info.has_next);
    /// assert!(info.has_prev);
    /// ```
    #[must_use]
    pub fn new(request: PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(request.limit));
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
            has_next: u64::from(request.page) < total_pages,
            has_prev: request.page > 1,
        }
    }
}

/// Items for one page plus the page metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Metadata describing the page.
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    /// Wrap one page of items.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            pagination: PageInfo::new(request, total),
        }
    }

    /// Transform every item while keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit coverage for page arithmetic.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 1, 12)]
    #[case(Some(4), None, 4, 12)]
    #[case(Some(1), Some(100), 1, 100)]
    fn accepts_in_range_requests(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] expected_page: u32,
        #[case] expected_limit: u32,
    ) {
        let request = PageRequest::try_new(page, limit, PageLimits::new(12, 100))
            .unwrap_or_else(|err| panic!("request should be valid: {err}"));
        assert_eq!(request.page(), expected_page);
        assert_eq!(request.limit(), expected_limit);
    }

    #[rstest]
    #[case(Some(0), None, PageRequestError::PageOutOfRange)]
    #[case(None, Some(0), PageRequestError::LimitOutOfRange { max: 100 })]
    #[case(None, Some(101), PageRequestError::LimitOutOfRange { max: 100 })]
    fn rejects_out_of_range_requests(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] expected: PageRequestError,
    ) {
        let result = PageRequest::try_new(page, limit, PageLimits::new(12, 100));
        assert_eq!(result, Err(expected));
    }

    #[rstest]
    fn empty_result_has_no_pages() {
        let info = PageInfo::new(PageRequest::first(PageLimits::default()), 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
        assert!(!info.has_prev);
    }

    #[rstest]
    fn last_page_has_no_next() {
        let request = PageRequest::try_new(Some(3), Some(10), PageLimits::default())
            .unwrap_or_else(|err| panic!("request should be valid: {err}"));
        let info = PageInfo::new(request, 30);
        assert_eq!(info.total_pages, 3);
        assert!(!info.has_next);
    }

    #[rstest]
    fn limits_widen_max_to_default() {
        let limits = PageLimits::new(50, 10);
        assert_eq!(limits.max_limit(), 50);
    }

    #[rstest]
    fn map_preserves_metadata() {
        let page = Paginated::new(vec![1, 2], PageRequest::first(PageLimits::default()), 2);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.pagination.total, 2);
    }
}
