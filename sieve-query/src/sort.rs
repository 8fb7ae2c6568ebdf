//! Sorting driven by a comma separated `?sort=` list.
//!
//! A leading `-` sorts that field descending. Without the parameter the
//! default ordering applies. Fields outside both the allow-list and the
//! default are skipped.
//!
//! ```rust
//! use sieve_query::{RequestParams, SelectQuery, SortScope};
//!
//! let params = RequestParams::from_query("sort=-name,age,occupation");
//! let sort = SortScope::new(["name", "age"]).default_order(["-id"]).with_ctx(&params);
//!
//! let query = sort.apply(SelectQuery::new("users")).unwrap();
//! let (sql, _) = query.build_sql().unwrap();
//! assert_eq!(sql, "SELECT * FROM \"users\" ORDER BY \"name\" DESC, \"age\" ASC");
//! ```

use tracing::debug;

use crate::config::ScopeConfig;
use crate::error::{QueryError, QueryResult};
use crate::params::RequestParams;
use crate::query::QueryBuilder;
use crate::types::{OrderByField, SortOrder};

const DESC_MARKER: char = '-';

/// Scope sorting results by the request's sort list or a default ordering.
#[derive(Debug, Clone, Default)]
pub struct SortScope {
    params: Option<RequestParams>,
    fields: Vec<String>,
    default: Vec<String>,
    alias: Option<String>,
    alias_excluded: Vec<String>,
    config: ScopeConfig,
}

impl SortScope {
    /// Create a sort scope allowing the given fields.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Ordering used when the request carries no sort list, e.g. `["id", "-updated_at"]`.
    pub fn default_order<I, S>(mut self, default: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default = default.into_iter().map(Into::into).collect();
        self
    }

    /// Qualify fields with a table alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Fields left unqualified when an alias is set.
    pub fn alias_excluded<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alias_excluded = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Bind the request parameters.
    pub fn with_ctx(mut self, params: &RequestParams) -> Self {
        self.params = Some(params.clone());
        self
    }

    /// Use a specific configuration.
    pub fn with_config(mut self, config: &ScopeConfig) -> Self {
        self.config = config.clone();
        self
    }

    fn is_sortable(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
            || self
                .default
                .iter()
                .any(|d| d.strip_prefix(DESC_MARKER).unwrap_or(d) == field)
    }

    fn column(&self, field: &str) -> String {
        let alias = self
            .alias
            .as_deref()
            .filter(|_| !self.alias_excluded.iter().any(|f| f == field));
        self.config.dialect.qualify(alias, field)
    }

    /// Resolve the ORDER BY columns for the bound request.
    pub fn orderings(&self) -> QueryResult<Vec<OrderByField>> {
        let params = self.params.as_ref().ok_or_else(|| {
            QueryError::missing_configuration("SortScope request context")
                .with_context("sort")
        })?;

        let requested: Vec<&str> = match params.get(&self.config.sort_param) {
            Some(list) if !list.is_empty() => list.split(',').collect(),
            _ => self.default.iter().map(String::as_str).collect(),
        };

        let orderings: Vec<OrderByField> = requested
            .into_iter()
            .map(str::trim)
            .filter_map(|entry| {
                let (field, order) = match entry.strip_prefix(DESC_MARKER) {
                    Some(field) => (field, SortOrder::Desc),
                    None => (entry, SortOrder::Asc),
                };
                (!field.is_empty() && self.is_sortable(field))
                    .then(|| OrderByField::new(self.column(field), order))
            })
            .collect();

        debug!(count = orderings.len(), "SortScope resolved orderings");
        Ok(orderings)
    }

    /// Append the resolved ORDER BY columns to the query.
    pub fn apply<Q: QueryBuilder>(&self, query: Q) -> QueryResult<Q> {
        Ok(self.orderings()?.into_iter().fold(query, <Q as QueryBuilder>::order_by))
    }

    /// Generate the query scope for sorting.
    ///
    /// Fails before producing a scope when no request context is bound.
    pub fn scope<Q: QueryBuilder>(&self) -> QueryResult<impl FnOnce(Q) -> Q + use<Q>> {
        let orderings = self.orderings()?;
        Ok(move |query: Q| {
            orderings
                .into_iter()
                .fold(query, <Q as QueryBuilder>::order_by)
        })
    }
}
