//! # sieve-query
//!
//! Query-string driven filtering, sorting and pagination scopes.
//!
//! This crate turns request parameters into parameterized SQL fragments:
//! - Filtering with `field` and `field__operator` tokens against an allow-list
//! - Value coercion from a declared record shape
//! - Caller-supplied special filters for tokens that need custom SQL
//! - Sorting from a comma separated `sort` list
//! - Offset pagination with a `{total, results, page, next, prev}` envelope
//!
//! Scopes never run SQL. They write into any [`QueryBuilder`]; [`SelectQuery`]
//! is the bundled builder that renders SQL for PostgreSQL, MySQL and SQLite.
//!
//! ## Filters
//!
//! ```rust
//! use sieve_query::{FieldKind, FilterScope, FilterValue, RecordShape, RequestParams, SelectQuery};
//!
//! let shape = RecordShape::new("User")
//!     .field("age", FieldKind::Number)
//!     .field("active", FieldKind::Bool);
//!
//! let params = RequestParams::from_query("age__lt=30&active=true&password=x");
//! let query = SelectQuery::new("users")
//!     .with_model(shape)
//!     .scope(FilterScope::new(["age", "active"]).with_ctx(&params).scope());
//!
//! let (sql, values) = query.build_sql().unwrap();
//! assert_eq!(sql, "SELECT * FROM \"users\" WHERE \"active\" = $1 AND \"age\" > $2");
//! assert_eq!(values, vec![FilterValue::Bool(true), FilterValue::from("30")]);
//! ```
//!
//! ## Operators
//!
//! | Token           | Fragment                |
//! |-----------------|-------------------------|
//! | `contains`      | `col LIKE '%v%'`        |
//! | `eq`            | `col = v`               |
//! | `neq`           | `col != v`              |
//! | `gt` / `gte`    | `col < v` / `col <= v`  |
//! | `lt` / `lte`    | `col > v` / `col >= v`  |
//! | `startswith`    | `col LIKE 'v%'`         |
//! | `endswith`      | `col LIKE '%v'`         |
//! | `in` / `not_in` | `col [NOT] IN (..)`     |
//! | `isnull`        | `col IS [NOT] NULL`     |
//!
//! ## Sorting and pagination
//!
//! ```rust
//! use sieve_query::{PageScope, RequestParams, SelectQuery, SortScope};
//!
//! let params = RequestParams::from_query("sort=-created_at&page=2&page_size=10");
//! let sort = SortScope::new(["created_at"]).default_order(["id"]).with_ctx(&params);
//! let page = PageScope::new(35).with_ctx(&params);
//!
//! let query = SelectQuery::new("posts")
//!     .scope(sort.scope().unwrap())
//!     .scope(page.scope());
//!
//! let (sql, _) = query.build_sql().unwrap();
//! assert_eq!(sql, "SELECT * FROM \"posts\" ORDER BY \"created_at\" DESC LIMIT 10 OFFSET 10");
//! assert_eq!(page.next(), Some(3));
//! ```
//!
//! ## Configuration
//!
//! Page limits, parameter names and the SQL dialect live in [`ScopeConfig`],
//! which loads from TOML or `SIEVE_*` environment variables.

pub mod compiler;
pub mod config;
pub mod error;
pub mod filter;
#[macro_use]
pub mod logging;
pub mod operator;
pub mod pagination;
pub mod params;
pub mod query;
pub mod shape;
pub mod sort;
pub mod special;
pub mod sql;
pub mod token;
pub mod types;

pub use compiler::{CompiledFilter, FilterScope};
pub use config::{EnvSource, MapEnvSource, ScopeConfig, StdEnvSource};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use filter::FilterValue;
pub use operator::{Operator, Predicate, PredicateTemplate};
pub use pagination::{PageCursor, PageScope, Paginated, Pagination};
pub use params::RequestParams;
pub use query::{QueryBuilder, SelectQuery};
pub use shape::{FieldKind, RecordShape};
pub use sort::SortScope;
pub use special::{SpecialFilter, SpecialFilters};
pub use sql::{DatabaseType, bind_placeholders};
pub use token::FilterToken;
pub use types::{OrderByField, SortOrder};

// Re-export logging utilities
pub use logging::{get_log_format, get_log_level, init as init_logging, is_debug_enabled};

// Re-export tracing for macros
#[doc(hidden)]
pub use tracing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::compiler::FilterScope;
    pub use crate::config::ScopeConfig;
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::FilterValue;
    pub use crate::pagination::{PageScope, Paginated};
    pub use crate::params::RequestParams;
    pub use crate::query::{QueryBuilder, SelectQuery};
    pub use crate::shape::{FieldKind, RecordShape};
    pub use crate::sort::SortScope;
    pub use crate::special::SpecialFilters;
    pub use crate::sql::DatabaseType;
    pub use crate::types::{OrderByField, SortOrder};
}
