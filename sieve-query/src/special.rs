//! Caller-supplied handlers for individual filter tokens.
//!
//! A special filter is keyed by the exact query key it replaces, for example
//! `age__neq` or `search`. Matching keys bypass the standard compiler. Their
//! raw values are collected and each handler runs after the standard WHERE
//! clause has been applied. Handlers see the untouched query-string value and
//! are responsible for binding it safely.
//!
//! ```rust
//! use sieve_query::{FilterValue, QueryBuilder, SelectQuery, SpecialFilters};
//!
//! let special = SpecialFilters::<SelectQuery>::new()
//!     .on("search", |value, query| {
//!         query.r#where("\"name\" LIKE ?", vec![FilterValue::from(format!("{}%", value))])
//!     });
//!
//! assert!(special.contains("search"));
//! assert!(!special.contains("search__eq"));
//! ```

use indexmap::IndexMap;
use std::fmt;

use crate::query::QueryBuilder;

/// A special filter handler: receives the raw value and the query, returns the
/// query.
pub type SpecialFilter<Q> = Box<dyn Fn(&str, Q) -> Q + Send + Sync>;

/// Special filter handlers keyed by query key, in registration order.
pub struct SpecialFilters<Q> {
    handlers: IndexMap<String, SpecialFilter<Q>>,
}

impl<Q: QueryBuilder> SpecialFilters<Q> {
    /// Create an empty handler map.
    pub fn new() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// Register a handler for an exact query key, replacing any previous one.
    pub fn on<F>(mut self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str, Q) -> Q + Send + Sync + 'static,
    {
        self.handlers.insert(key.into(), Box::new(handler));
        self
    }

    /// Check if a handler is registered for the key.
    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Run every handler whose key has a pending value, in registration order.
    pub fn dispatch(&self, pending: &IndexMap<String, String>, mut query: Q) -> Q {
        for (key, handler) in &self.handlers {
            if let Some(value) = pending.get(key) {
                tracing::debug!(key = %key, "dispatching special filter");
                query = handler(value, query);
            }
        }
        query
    }
}

impl<Q: QueryBuilder> Default for SpecialFilters<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q> fmt::Debug for SpecialFilters<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecialFilters")
            .field("keys", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
