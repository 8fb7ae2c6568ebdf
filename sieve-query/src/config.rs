//! Scope configuration.
//!
//! [`ScopeConfig`] holds the page limits, reserved parameter names and SQL
//! dialect shared by the filter, sort and page scopes. It can be built in
//! code, deserialized from TOML, or read from `SIEVE_*` environment variables.
//!
//! ```rust
//! use sieve_query::{DatabaseType, ScopeConfig};
//!
//! let config = ScopeConfig::from_toml_str(r#"
//!     max_page_size = 100
//!     dialect = "mysql"
//! "#).unwrap();
//!
//! assert_eq!(config.max_page_size, 100);
//! assert_eq!(config.page_size, 20);
//! assert_eq!(config.dialect, DatabaseType::MySQL);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{QueryError, QueryResult};
use crate::sql::DatabaseType;

/// Maximum number of items that can be returned per page.
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 200;
/// Default number of items to return per page.
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Query param for the current page.
pub const DEFAULT_PAGE_PARAM: &str = "page";
/// Query param for the number of items per page.
pub const DEFAULT_PAGE_SIZE_PARAM: &str = "page_size";
/// Query param for the comma separated sort list.
pub const DEFAULT_SORT_PARAM: &str = "sort";

/// Configuration shared by all scopes built for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Upper bound for the page size.
    pub max_page_size: u64,
    /// Page size used when none, or a non-positive one, is requested.
    pub page_size: u64,
    /// Name of the page number parameter.
    pub page_param: String,
    /// Name of the page size parameter.
    pub page_size_param: String,
    /// Name of the sort list parameter.
    pub sort_param: String,
    /// SQL dialect for identifier quoting and placeholders.
    pub dialect: DatabaseType,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            page_param: DEFAULT_PAGE_PARAM.to_string(),
            page_size_param: DEFAULT_PAGE_SIZE_PARAM.to_string(),
            sort_param: DEFAULT_SORT_PARAM.to_string(),
            dialect: DatabaseType::default(),
        }
    }
}

impl ScopeConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dialect.
    pub fn dialect(mut self, dialect: DatabaseType) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the default and maximum page sizes.
    pub fn page_sizes(mut self, page_size: u64, max_page_size: u64) -> Self {
        self.page_size = page_size;
        self.max_page_size = max_page_size;
        self
    }

    /// Parameter names consumed by the sort and page scopes.
    pub fn reserved_params(&self) -> [&str; 3] {
        [
            self.page_param.as_str(),
            self.page_size_param.as_str(),
            self.sort_param.as_str(),
        ]
    }

    /// Check that the page sizes are usable.
    pub fn validate(&self) -> QueryResult<()> {
        if self.max_page_size == 0 {
            return Err(QueryError::invalid_configuration("max_page_size must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(QueryError::invalid_configuration("page_size must be at least 1"));
        }
        if self.page_size > self.max_page_size {
            return Err(QueryError::invalid_configuration(format!(
                "page_size ({}) exceeds max_page_size ({})",
                self.page_size, self.max_page_size
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> QueryResult<Self> {
        let config: Self = toml::from_str(input).map_err(|e| {
            let message = format!("invalid scope configuration: {}", e.message());
            QueryError::invalid_configuration(message).with_source(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the configuration from the process environment.
    ///
    /// See [`ScopeConfig::from_source`] for the recognized variables.
    pub fn from_env() -> QueryResult<Self> {
        Self::from_source(&StdEnvSource)
    }

    /// Read the configuration from an environment source.
    ///
    /// Recognized variables, each optional:
    /// - `SIEVE_MAX_PAGE_SIZE`
    /// - `SIEVE_PAGE_SIZE`
    /// - `SIEVE_PAGE_PARAM`
    /// - `SIEVE_PAGE_SIZE_PARAM`
    /// - `SIEVE_SORT_PARAM`
    /// - `SIEVE_DIALECT`
    pub fn from_source<S: EnvSource>(source: &S) -> QueryResult<Self> {
        let mut config = Self::default();

        if let Some(v) = source.get("SIEVE_MAX_PAGE_SIZE") {
            config.max_page_size = parse_size("SIEVE_MAX_PAGE_SIZE", &v)?;
        }
        if let Some(v) = source.get("SIEVE_PAGE_SIZE") {
            config.page_size = parse_size("SIEVE_PAGE_SIZE", &v)?;
        }
        if let Some(v) = source.get("SIEVE_PAGE_PARAM") {
            config.page_param = v;
        }
        if let Some(v) = source.get("SIEVE_PAGE_SIZE_PARAM") {
            config.page_size_param = v;
        }
        if let Some(v) = source.get("SIEVE_SORT_PARAM") {
            config.sort_param = v;
        }
        if let Some(v) = source.get("SIEVE_DIALECT") {
            config.dialect = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_size(name: &str, value: &str) -> QueryResult<u64> {
    value.trim().parse::<u64>().map_err(|e| {
        let message = format!("{} must be a positive integer, got {:?}", name, value);
        QueryError::invalid_configuration(message).with_source(e)
    })
}

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get an environment variable value.
    fn get(&self, name: &str) -> Option<String>;
}

/// Environment source using `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a HashMap.
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Create a new map-based environment source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
