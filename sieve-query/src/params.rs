//! Query-string parameters for one inbound request.
//!
//! Keys are kept sorted so every scope sees the parameters in the same
//! canonical order. Repeated keys keep their last value.
//!
//! ```rust
//! use sieve_query::RequestParams;
//!
//! let params = RequestParams::from_query("name__contains=Jo&age=22&age=30");
//! assert_eq!(params.get("age"), Some("30"));
//! assert_eq!(params.keys().collect::<Vec<_>>(), vec!["age", "name__contains"]);
//!
//! let params = RequestParams::from_uri("/users?page=2").unwrap();
//! assert_eq!(params.get_int("page", 0), 2);
//! ```

use std::collections::BTreeMap;
use url::Url;

use crate::error::{QueryError, QueryResult};

/// Decoded query parameters of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    params: BTreeMap<String, String>,
}

impl RequestParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Decode the query of a request URI.
    ///
    /// Accepts absolute URLs and origin-form URIs starting with `/`.
    pub fn from_uri(uri: &str) -> QueryResult<Self> {
        let parsed = if uri.starts_with('/') {
            let base = Url::parse("http://localhost/").map_err(invalid_uri(uri))?;
            base.join(uri).map_err(invalid_uri(uri))?
        } else {
            Url::parse(uri).map_err(invalid_uri(uri))?
        };

        Ok(parsed.query_pairs().into_owned().collect())
    }

    /// Get a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a parameter as an integer, falling back to `default` when it is
    /// missing or not an integer.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Check if a parameter is present.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Insert a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Iterate over parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn invalid_uri(uri: &str) -> impl FnOnce(url::ParseError) -> QueryError + '_ {
    move |e| {
        QueryError::invalid_parameter(format!("cannot parse uri {:?}: {}", uri, e))
            .with_source(e)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}
