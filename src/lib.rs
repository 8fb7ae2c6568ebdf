//! # Sieve
//!
//! Query-string filtering, sorting and pagination for SQL query builders.
//!
//! Sieve provides:
//! - `field` and `field__operator` filters compiled to parameterized SQL
//! - An allow-list so only declared fields are ever filtered or sorted on
//! - Special filters for tokens that need hand-written SQL
//! - Offset pagination with a `{total, results, page, next, prev}` envelope
//! - Axum extractors and JSON responses (the `axum` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use sieve::prelude::*;
//!
//! let params = RequestParams::from_query("name__startswith=Jo&sort=-age&page=1&page_size=5");
//!
//! let query = SelectQuery::new("users")
//!     .scope(FilterScope::new(["name", "age"]).with_ctx(&params).scope())
//!     .scope(SortScope::new(["name", "age"]).with_ctx(&params).scope().unwrap())
//!     .scope(PageScope::new(12).with_ctx(&params).scope());
//!
//! let (sql, values) = query.build_sql().unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM \"users\" WHERE \"name\" LIKE $1 ORDER BY \"age\" DESC LIMIT 5 OFFSET 0"
//! );
//! assert_eq!(values, vec![FilterValue::from("Jo%")]);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Filter, sort and page scopes.
pub mod query {
    pub use sieve_query::*;
}

/// Axum integration.
#[cfg(feature = "axum")]
#[cfg_attr(docsrs, doc(cfg(feature = "axum")))]
pub mod axum {
    pub use sieve_axum::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sieve_query::prelude::*;

    #[cfg(feature = "axum")]
    pub use sieve_axum::{ListQuery, PageScopeExt, ScopeContext, SieveAxumError};
}

// Re-export key types at the crate root
pub use sieve_query::{
    FilterScope, FilterValue, PageScope, Paginated, QueryBuilder, QueryError, QueryResult,
    RequestParams, ScopeConfig, SortScope,
};
