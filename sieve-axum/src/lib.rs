//! Axum integration for sieve query scopes.
//!
//! This crate connects the scopes in `sieve-query` to the
//! [Axum](https://github.com/tokio-rs/axum) web framework.
//!
//! # Features
//!
//! - **Extractors**: [`ListQuery`] for raw request parameters, [`ScopeContext`]
//!   for parameters plus a shared [`ScopeConfig`] from router state
//! - **Responses**: [`PageScopeExt`] turns a page scope and its rows into a JSON
//!   envelope
//! - **Errors**: [`SieveAxumError`] maps scope failures to HTTP responses
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::{Json, Router, routing::get};
//! use sieve_axum::prelude::*;
//!
//! async fn list_users(ListQuery(params): ListQuery) -> Result<Json<Paginated<Vec<User>>>> {
//!     let query = SelectQuery::new("users")
//!         .scope(FilterScope::new(["name", "age"]).with_ctx(&params).scope())
//!         .scope(SortScope::new(["name"]).default_order(["-id"]).with_ctx(&params).scope()?);
//!
//!     let total = db.count(&query).await?;
//!     let page = PageScope::new(total).with_ctx(&params);
//!     let users = db.fetch(query.scope(page.scope())).await?;
//!
//!     Ok(page.resp(users))
//! }
//!
//! let app = Router::new().route("/users", get(list_users));
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    response::IntoResponse,
};
use http::{StatusCode, request::Parts};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use sieve_query::PageCursor;

// Re-export key types
pub use sieve_query::prelude::*;

/// Errors that can occur while scoping a request.
#[derive(Error, Debug)]
pub enum SieveAxumError {
    /// A scope failed to build.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl SieveAxumError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            SieveAxumError::Query(e) if e.is_configuration_error() => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            SieveAxumError::Query(_) => StatusCode::BAD_REQUEST,
            SieveAxumError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SieveAxumError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = match &self {
            SieveAxumError::Query(e) => e.code.code(),
            SieveAxumError::ConfigError(_) => "S7001".to_string(),
        };
        if status.is_server_error() {
            warn!(code = %code, error = %self, "scope error");
        }
        let body = serde_json::json!({ "code": code, "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Result type for sieve-axum handlers.
pub type Result<T> = std::result::Result<T, SieveAxumError>;

/// Extractor for the decoded query parameters of a request.
///
/// Never rejects: a request without a query string yields empty parameters.
///
/// # Example
///
/// ```rust,ignore
/// use sieve_axum::ListQuery;
///
/// async fn handler(ListQuery(params): ListQuery) -> String {
///     params.get("name").unwrap_or_default().to_string()
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ListQuery(pub RequestParams);

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let params = RequestParams::from_query(parts.uri.query().unwrap_or_default());
        debug!(path = %parts.uri.path(), params = params.len(), "ListQuery extracted");
        Ok(ListQuery(params))
    }
}

/// Extractor for request parameters paired with the router's [`ScopeConfig`].
///
/// Requires `Arc<ScopeConfig>` to be obtainable from the router state.
///
/// # Example
///
/// ```rust,ignore
/// use sieve_axum::ScopeContext;
///
/// async fn handler(ctx: ScopeContext) -> String {
///     let sort = ctx.sort(["name"]).default_order(["id"]);
///     format!("{:?}", sort.orderings())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScopeContext {
    /// The request parameters.
    pub params: RequestParams,
    /// The shared configuration.
    pub config: Arc<ScopeConfig>,
}

impl ScopeContext {
    /// A filter scope bound to this request.
    pub fn filter<Q, I, F>(&self, fields: I) -> FilterScope<Q>
    where
        Q: QueryBuilder,
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        FilterScope::new(fields)
            .with_ctx(&self.params)
            .with_config(&self.config)
    }

    /// A sort scope bound to this request.
    pub fn sort<I, F>(&self, fields: I) -> SortScope
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        SortScope::new(fields)
            .with_ctx(&self.params)
            .with_config(&self.config)
    }

    /// A page scope bound to this request.
    pub fn page(&self, total: u64) -> PageScope {
        PageScope::new(total)
            .with_ctx(&self.params)
            .with_config(&self.config)
    }
}

impl<S> FromRequestParts<S> for ScopeContext
where
    Arc<ScopeConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let ListQuery(params) = ListQuery::from_request_parts(parts, state).await?;
        Ok(ScopeContext {
            params,
            config: Arc::<ScopeConfig>::from_ref(state),
        })
    }
}

/// JSON responses built from a [`PageScope`].
pub trait PageScopeExt {
    /// Respond with the default `{total, results, page, next, prev}` envelope.
    fn resp<T: Serialize>(&self, results: T) -> Json<Paginated<T>>;

    /// Respond with a custom envelope.
    fn resp_with<T, B, F>(&self, results: T, shape: F) -> Json<B>
    where
        B: Serialize,
        F: FnOnce(&PageCursor, u64, T) -> B;
}

impl PageScopeExt for PageScope {
    fn resp<T: Serialize>(&self, results: T) -> Json<Paginated<T>> {
        Json(self.body(results))
    }

    fn resp_with<T, B, F>(&self, results: T, shape: F) -> Json<B>
    where
        B: Serialize,
        F: FnOnce(&PageCursor, u64, T) -> B,
    {
        Json(self.body_with(results, shape))
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{ListQuery, PageScopeExt, Result, ScopeContext, SieveAxumError};
    pub use sieve_query::prelude::*;
}
