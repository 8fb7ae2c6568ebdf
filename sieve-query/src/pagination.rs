//! Offset pagination driven by `?page=` and `?page_size=`.
//!
//! [`PageScope`] turns the requested page into OFFSET/LIMIT on the query and
//! into a [`Paginated`] response body. The caller supplies the total row
//! count, usually from a separate `COUNT(*)` query run with the same filters.
//!
//! ```rust
//! use sieve_query::{PageScope, RequestParams, ScopeConfig};
//!
//! let params = RequestParams::from_query("page=3&page_size=10");
//! let page = PageScope::new(50).with_ctx(&params);
//!
//! assert_eq!(page.current(), 3);
//! assert_eq!(page.previous(), Some(2));
//! assert_eq!(page.next(), Some(4));
//!
//! let body = serde_json::to_value(page.body(vec!["a", "b"])).unwrap();
//! assert_eq!(body["page"], 3);
//! assert_eq!(body["next"], 4);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::config::ScopeConfig;
use crate::params::RequestParams;
use crate::query::QueryBuilder;

/// OFFSET/LIMIT values for a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Number of records to skip.
    pub skip: Option<u64>,
    /// Maximum number of records to take.
    pub take: Option<u64>,
}

impl Pagination {
    /// Create a new pagination with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of records to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of records to take.
    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    /// Check if pagination is specified.
    pub fn is_empty(&self) -> bool {
        self.skip.is_none() && self.take.is_none()
    }

    /// Generate SQL LIMIT/OFFSET clause.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(32);
        self.write_sql(&mut sql);
        sql
    }

    /// Write SQL LIMIT/OFFSET clause directly to a buffer.
    #[inline]
    pub fn write_sql(&self, buffer: &mut String) {
        if let Some(take) = self.take {
            let _ = write!(buffer, "LIMIT {}", take);
        }

        if let Some(skip) = self.skip {
            if self.take.is_some() {
                buffer.push(' ');
            }
            let _ = write!(buffer, "OFFSET {}", skip);
        }
    }

    /// Get pagination for a page (1-indexed).
    pub fn page(page: u64, page_size: u64) -> Self {
        let skip = page.saturating_sub(1) * page_size;
        Self::new().skip(skip).take(page_size)
    }
}

/// Page numbers derived for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Current page, 1-indexed.
    pub current: u64,
    /// Previous page, absent on the first page.
    pub previous: Option<u64>,
    /// Next page, absent on the last page.
    pub next: Option<u64>,
    /// Normalized page size.
    pub page_size: u64,
    /// Last page, at least 1.
    pub max_page: u64,
}

impl PageCursor {
    /// Compute the cursor for a requested page and page size.
    ///
    /// A non-positive page size falls back to `config.page_size`. Either
    /// size is capped at `config.max_page_size`. The page is clamped to
    /// `1..=max_page`.
    pub fn compute(
        requested_page: i64,
        requested_size: i64,
        total: u64,
        config: &ScopeConfig,
    ) -> Self {
        let page_size = if requested_size <= 0 {
            config.page_size
        } else {
            requested_size as u64
        }
        .min(config.max_page_size)
        .max(1);

        let max_page = total.div_ceil(page_size).max(1);
        let current = if requested_page <= 0 {
            1
        } else {
            (requested_page as u64).min(max_page)
        };

        Self {
            current,
            previous: (current > 1).then(|| current - 1),
            next: (current < max_page).then(|| current + 1),
            page_size,
            max_page,
        }
    }

    /// Rows to skip before the current page.
    pub fn offset(&self) -> u64 {
        (self.current - 1) * self.page_size
    }

    /// OFFSET/LIMIT for the current page.
    pub fn pagination(&self) -> Pagination {
        Pagination::page(self.current, self.page_size)
    }
}

/// Default paginated response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Total number of matching rows.
    pub total: u64,
    /// The rows of the current page.
    pub results: T,
    /// Current page.
    pub page: u64,
    /// Next page, omitted on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<u64>,
    /// Previous page, omitted on the first page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<u64>,
}

/// Scope paginating results by the `page` and `page_size` request parameters.
#[derive(Debug, Clone)]
pub struct PageScope {
    params: RequestParams,
    total: u64,
    config: ScopeConfig,
    cursor: PageCursor,
}

impl PageScope {
    /// Create a page scope for a result set of `total` rows.
    pub fn new(total: u64) -> Self {
        let params = RequestParams::new();
        let config = ScopeConfig::default();
        let cursor = Self::read_cursor(&params, total, &config);
        Self {
            params,
            total,
            config,
            cursor,
        }
    }

    /// Bind the request parameters.
    pub fn with_ctx(mut self, params: &RequestParams) -> Self {
        self.params = params.clone();
        self.cursor = Self::read_cursor(&self.params, self.total, &self.config);
        self
    }

    /// Use a specific configuration.
    pub fn with_config(mut self, config: &ScopeConfig) -> Self {
        self.config = config.clone();
        self.cursor = Self::read_cursor(&self.params, self.total, &self.config);
        self
    }

    fn read_cursor(params: &RequestParams, total: u64, config: &ScopeConfig) -> PageCursor {
        let page = params.get_int(&config.page_param, 0);
        let size = params.get_int(&config.page_size_param, config.page_size as i64);
        PageCursor::compute(page, size, total, config)
    }

    /// The expected total number of results.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The page cursor for the bound request and configuration.
    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    /// Returns the current page number.
    pub fn current(&self) -> u64 {
        self.cursor.current
    }

    /// Returns the previous page number.
    pub fn previous(&self) -> Option<u64> {
        self.cursor.previous
    }

    /// Returns the next page number.
    pub fn next(&self) -> Option<u64> {
        self.cursor.next
    }

    /// Returns the normalized page size.
    pub fn page_size(&self) -> u64 {
        self.cursor.page_size
    }

    /// Apply OFFSET/LIMIT for the current page.
    pub fn apply<Q: QueryBuilder>(&self, query: Q) -> Q {
        let cursor = self.cursor;
        tracing::debug!(
            page = cursor.current,
            page_size = cursor.page_size,
            max_page = cursor.max_page,
            "applying page scope"
        );
        query.skip(cursor.offset()).take(cursor.page_size)
    }

    /// Generate the query scope for pagination.
    pub fn scope<Q: QueryBuilder>(&self) -> impl FnOnce(Q) -> Q + '_ {
        move |query| self.apply(query)
    }

    /// Build the default response body.
    pub fn body<T>(&self, results: T) -> Paginated<T> {
        let cursor = self.cursor;
        Paginated {
            total: self.total,
            results,
            page: cursor.current,
            next: cursor.next,
            prev: cursor.previous,
        }
    }

    /// Build a custom response body from the cursor and total.
    pub fn body_with<T, B>(
        &self,
        results: T,
        shape: impl FnOnce(&PageCursor, u64, T) -> B,
    ) -> B {
        shape(&self.cursor, self.total, results)
    }
}
