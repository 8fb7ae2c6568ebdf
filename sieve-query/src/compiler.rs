//! The filter scope: query parameters in, parameterized WHERE clause out.
//!
//! Every request parameter is classified by [`FilterToken::classify`]:
//!
//! - `?name=John` compiles to equality on an allow-listed field.
//! - `?age__gt=18` compiles the named operator.
//! - Keys registered as special filters are set aside for their handlers.
//! - Anything else is dropped without a trace.
//!
//! Values are coerced against the query's [`RecordShape`], the field is
//! quoted (and optionally qualified and date-truncated), and the predicates
//! are joined into a single AND clause.
//!
//! ```rust
//! use sieve_query::{FilterScope, FilterValue, RequestParams, SelectQuery};
//!
//! let params = RequestParams::from_query("name__contains=2&age=22&occupation=dev");
//! let filter = FilterScope::<SelectQuery>::new(["age", "name"]).with_ctx(&params);
//!
//! let compiled = filter.compile(None);
//! assert_eq!(compiled.where_sql().unwrap(), "\"age\" = ? AND \"name\" LIKE ?");
//! assert_eq!(compiled.values, vec![FilterValue::from("22"), FilterValue::from("%2%")]);
//! ```

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::ScopeConfig;
use crate::filter::FilterValue;
use crate::params::RequestParams;
use crate::query::QueryBuilder;
use crate::shape::{RecordShape, coerce, date_truncate};
use crate::special::SpecialFilters;
use crate::token::FilterToken;

/// Output of compiling one request's filter parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    /// Predicate fragments with `?` placeholders.
    pub predicates: Vec<String>,
    /// Bound values in placeholder order.
    pub values: Vec<FilterValue>,
    /// Raw values for matched special-filter keys.
    pub pending: IndexMap<String, String>,
}

impl CompiledFilter {
    /// Check if no standard predicate was compiled.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// The predicates joined with AND, or `None` when there are none.
    pub fn where_sql(&self) -> Option<String> {
        if self.predicates.is_empty() {
            None
        } else {
            Some(self.predicates.join(" AND "))
        }
    }
}

/// Scope filtering results by the allow-listed fields present in a request.
///
/// Built fresh per request.
pub struct FilterScope<Q> {
    params: Option<RequestParams>,
    fields: Vec<String>,
    special: SpecialFilters<Q>,
    force_date: bool,
    from_uri: Option<String>,
    alias: Option<String>,
    config: ScopeConfig,
}

impl<Q: QueryBuilder> FilterScope<Q> {
    /// Create a filter scope allowing the given fields.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: None,
            fields: fields.into_iter().map(Into::into).collect(),
            special: SpecialFilters::new(),
            force_date: false,
            from_uri: None,
            alias: None,
            config: ScopeConfig::default(),
        }
    }

    /// Bind the request parameters.
    pub fn with_ctx(mut self, params: &RequestParams) -> Self {
        self.params = Some(params.clone());
        self
    }

    /// Set the special filter handlers.
    pub fn special(mut self, special: SpecialFilters<Q>) -> Self {
        self.special = special;
        self
    }

    /// Compare date fields by calendar date.
    pub fn force_date(mut self, force_date: bool) -> Self {
        self.force_date = force_date;
        self
    }

    /// Read parameters from this URI instead of the bound request.
    pub fn from_uri(mut self, uri: impl Into<String>) -> Self {
        self.from_uri = Some(uri.into());
        self
    }

    /// Qualify every field with a table alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Use a specific configuration.
    pub fn with_config(mut self, config: &ScopeConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// The allow-listed fields.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn query_params(&self) -> RequestParams {
        if let Some(uri) = self.from_uri.as_deref().filter(|u| !u.is_empty()) {
            return match RequestParams::from_uri(uri) {
                Ok(params) => params,
                Err(e) => {
                    warn!(uri = %uri, error = %e, "FilterScope: failed to parse query params");
                    RequestParams::new()
                }
            };
        }

        match &self.params {
            Some(params) => params.clone(),
            None => {
                debug!("FilterScope: no request parameters bound");
                RequestParams::new()
            }
        }
    }

    fn column(&self, model: Option<&RecordShape>, field: &str) -> String {
        let column = self.config.dialect.qualify(self.alias.as_deref(), field);
        if self.force_date && model.is_some_and(|m| m.is_temporal(field)) {
            date_truncate(&column)
        } else {
            column
        }
    }

    /// Compile the request's filter parameters against a record shape.
    pub fn compile(&self, model: Option<&RecordShape>) -> CompiledFilter {
        let params = self.query_params();
        let reserved = self.config.reserved_params();
        let mut compiled = CompiledFilter::default();

        for (key, raw) in params.iter() {
            if reserved.contains(&key) {
                continue;
            }

            let token = FilterToken::classify(key, &self.fields, |k| self.special.contains(k));
            let (field, operator) = match token {
                Some(FilterToken::Special(key)) => {
                    compiled.pending.insert(key.to_string(), raw.to_string());
                    continue;
                }
                Some(FilterToken::Field { field, operator }) => (field, operator),
                None => continue,
            };

            let value = match coerce(model, field, raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(key = %key, error = %e, "FilterScope: failed to convert value");
                    continue;
                }
            };

            let predicate = operator.apply(&self.column(model, field), value);
            compiled.predicates.push(predicate.sql);
            if let Some(value) = predicate.value {
                compiled.values.push(value);
            }
        }

        crate::sieve_debug!(
            sql = %compiled.predicates.join(" AND "),
            values = compiled.values.len(),
            special = compiled.pending.len(),
            "FilterScope compiled"
        );
        compiled
    }

    /// Apply the compiled WHERE clause, then any matched special filters.
    pub fn apply(&self, query: Q) -> Q {
        let compiled = self.compile(query.model());
        let mut query = query;

        if let Some(sql) = compiled.where_sql() {
            query = query.r#where(sql, compiled.values);
        }

        self.special.dispatch(&compiled.pending, query)
    }

    /// Generate the query scope for filtering.
    pub fn scope(self) -> impl FnOnce(Q) -> Q {
        move |query| self.apply(query)
    }
}

impl<Q> std::fmt::Debug for FilterScope<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterScope")
            .field("fields", &self.fields)
            .field("special", &self.special)
            .field("force_date", &self.force_date)
            .field("from_uri", &self.from_uri)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SelectQuery;
    use crate::shape::FieldKind;
    use crate::sql::DatabaseType;
    use pretty_assertions::assert_eq;

    fn shape() -> RecordShape {
        RecordShape::new("TestModel").fields([
            ("id", FieldKind::Number),
            ("name", FieldKind::String),
            ("age", FieldKind::Number),
            ("active", FieldKind::Bool),
            ("created_at", FieldKind::Date),
        ])
    }

    fn scope(query: &str, fields: &[&str]) -> FilterScope<SelectQuery> {
        FilterScope::new(fields.iter().copied())
            .with_ctx(&RequestParams::from_query(query))
            .with_config(&ScopeConfig::default().dialect(DatabaseType::MySQL))
    }

    #[test]
    fn test_bare_field_equals_eq_operator() {
        let bare = scope("name=John", &["name"]).compile(None);
        let explicit = scope("name__eq=John", &["name"]).compile(None);
        assert_eq!(bare, explicit);
        assert_eq!(bare.predicates, vec!["`name` = ?"]);
    }

    #[test]
    fn test_unknown_field_and_operator_dropped() {
        let compiled = scope("age__gt=1&name__has=2&occupation=x", &["age", "name"])
            .compile(None);
        assert_eq!(compiled.predicates, vec!["`age` < ?"]);
        assert_eq!(compiled.values, vec![FilterValue::from("1")]);
    }

    #[test]
    fn test_non_allow_listed_field_is_identical_to_omission() {
        let with = scope("age=3&secret=1", &["age"]).compile(None);
        let without = scope("age=3", &["age"]).compile(None);
        assert_eq!(with, without);
    }

    #[test]
    fn test_reserved_params_skipped() {
        let compiled = scope("page=2&page_size=5&sort=name", &["page", "sort", "page_size"])
            .compile(None);
        assert!(compiled.is_empty());
        assert_eq!(compiled.where_sql(), None);
    }

    #[test]
    fn test_bool_coercion() {
        let compiled = scope("active=true", &["active"]).compile(Some(&shape()));
        assert_eq!(compiled.values, vec![FilterValue::Bool(true)]);

        let compiled = scope("active=maybe&name=x", &["active", "name"])
            .compile(Some(&shape()));
        assert_eq!(compiled.predicates, vec!["`name` = ?"]);
    }

    #[test]
    fn test_isnull_binds_nothing() {
        let compiled = scope("active__isnull=true&name__isnull=0", &["active", "name"])
            .compile(Some(&shape()));
        assert_eq!(
            compiled.predicates,
            vec!["`active` IS NULL", "`name` IS NOT NULL"]
        );
        assert!(compiled.values.is_empty());
    }

    #[test]
    fn test_isnull_on_bool_field_with_unparseable_value_is_dropped() {
        let compiled = scope("active__isnull=yes", &["active"]).compile(Some(&shape()));
        assert!(compiled.is_empty());
    }

    #[test]
    fn test_in_splits_values() {
        let compiled = scope("name__in=a,b,c", &["name"]).compile(None);
        assert_eq!(compiled.predicates, vec!["`name` IN (?)"]);
        assert_eq!(
            compiled.values,
            vec![FilterValue::from(vec!["a", "b", "c"])]
        );
    }

    #[test]
    fn test_alias_qualifies_every_predicate() {
        let compiled = scope("age__gte=3&name=x", &["age", "name"])
            .alias("u")
            .compile(None);
        assert_eq!(
            compiled.predicates,
            vec!["`u`.`age` <= ?", "`u`.`name` = ?"]
        );
    }

    #[test]
    fn test_force_date_wraps_temporal_fields() {
        let query = "created_at__gte=2024-01-01&created_at=2024-02-01&name=x";
        let compiled = scope(query, &["created_at", "name"])
            .force_date(true)
            .compile(Some(&shape()));
        assert_eq!(
            compiled.predicates,
            vec!["DATE(`created_at`) = ?", "DATE(`created_at`) <= ?", "`name` = ?"]
        );
    }

    #[test]
    fn test_force_date_with_alias() {
        let compiled = scope("created_at__lt=2024-01-01", &["created_at"])
            .alias("u")
            .force_date(true)
            .compile(Some(&shape()));
        assert_eq!(compiled.predicates, vec!["DATE(`u`.`created_at`) > ?"]);
    }

    #[test]
    fn test_force_date_needs_a_shape() {
        let compiled = scope("created_at=2024-01-01", &["created_at"])
            .force_date(true)
            .compile(None);
        assert_eq!(compiled.predicates, vec!["`created_at` = ?"]);
    }

    #[test]
    fn test_from_uri_overrides_request() {
        let compiled = scope("age=1", &["age"])
            .from_uri("/users?age=2")
            .compile(None);
        assert_eq!(compiled.values, vec![FilterValue::from("2")]);
    }

    #[test]
    fn test_malformed_uri_disables_filtering() {
        let compiled = scope("age=1", &["age"]).from_uri("not a uri").compile(None);
        assert!(compiled.is_empty());
    }

    #[test]
    fn test_no_context_compiles_nothing() {
        let filter = FilterScope::<SelectQuery>::new(["age"]);
        assert!(filter.compile(None).is_empty());
    }

    #[test]
    fn test_special_precedence() {
        let special = SpecialFilters::new().on("age__neq", |_, q: SelectQuery| {
            q.r#where("`age` != ?", vec![FilterValue::Int(2)])
        });
        let filter = scope("age__neq=1", &["age"]).special(special);

        let compiled = filter.compile(None);
        assert!(compiled.is_empty());
        assert_eq!(
            compiled.pending.get("age__neq").map(String::as_str),
            Some("1")
        );

        let query = filter.apply(SelectQuery::new("test_models"));
        assert_eq!(query.conditions().len(), 1);
        assert_eq!(query.conditions()[0].1, vec![FilterValue::Int(2)]);
    }

    #[test]
    fn test_standard_clause_precedes_special_handlers() {
        let special = SpecialFilters::new().on("q", |v, q: SelectQuery| {
            q.r#where("`name` LIKE ?", vec![FilterValue::from(format!("{}%", v))])
        });
        let query = scope("q=Jo&age=3", &["age"])
            .special(special)
            .apply(SelectQuery::new("t").with_db_type(DatabaseType::MySQL));

        let (sql, params) = query.build_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM `t` WHERE (`age` = ?) AND (`name` LIKE ?)"
        );
        assert_eq!(
            params,
            vec![FilterValue::from("3"), FilterValue::from("Jo%")]
        );
    }

    #[test]
    fn test_apply_uses_query_model() {
        let query = scope("active=1", &["active"])
            .apply(SelectQuery::new("t").with_model(shape()));
        assert_eq!(query.conditions()[0].1, vec![FilterValue::Bool(true)]);
    }

    #[test]
    fn test_empty_filter_leaves_query_untouched() {
        let query = scope("", &["age"]).apply(SelectQuery::new("t"));
        assert!(query.conditions().is_empty());
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let q = "name__startswith=J&age__lte=40&active=false&name__in=a,b";
        let a = scope(q, &["name", "age", "active"]).compile(Some(&shape()));
        let b = scope(q, &["name", "age", "active"]).compile(Some(&shape()));
        assert_eq!(a, b);
        assert_eq!(
            a.predicates,
            vec!["`active` = ?", "`age` >= ?", "`name` IN (?)", "`name` LIKE ?"]
        );
    }

    #[test]
    fn test_hostile_values_stay_out_of_sql() {
        let hostile = "1' OR '1'='1";
        let encoded = hostile
            .replace('\'', "%27")
            .replace('=', "%3D")
            .replace(' ', "+");
        let query = format!("name={}&age__contains=x", encoded);
        let compiled = scope(&query, &["name", "age"]).compile(None);
        let sql = compiled.where_sql().unwrap();
        assert!(!sql.contains("OR"));
        assert!(compiled.values.contains(&FilterValue::from(hostile)));
    }

    #[cfg(feature = "tracing-subscriber")]
    mod diagnostics {
        use super::*;
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        fn warnings(f: impl FnOnce()) -> String {
            let captured = Captured::default();
            let writer = captured.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::WARN)
                .finish();
            tracing::subscriber::with_default(subscriber, f);

            let bytes = captured.0.lock().unwrap().clone();
            String::from_utf8(bytes).unwrap()
        }

        #[test]
        fn test_unknown_tokens_are_silent() {
            let logs = warnings(|| {
                scope("occupation=x&name__has=1&name__eq__eq=2", &["name"])
                    .compile(Some(&shape()));
            });
            assert_eq!(logs, "");
        }

        #[test]
        fn test_bool_parse_failure_is_logged() {
            let logs = warnings(|| {
                let compiled = scope("active=maybe", &["active"]).compile(Some(&shape()));
                assert!(compiled.is_empty());
            });
            assert!(logs.contains("WARN"));
            assert!(logs.contains("failed to convert value"));
            assert!(logs.contains("active"));
        }

        #[test]
        fn test_field_missing_from_shape_is_logged() {
            let logs = warnings(|| {
                let compiled = scope("nickname=jo", &["nickname"]).compile(Some(&shape()));
                assert_eq!(compiled.values, vec![FilterValue::from("jo")]);
            });
            assert!(logs.contains("field not found on record shape"));
        }

        #[test]
        fn test_malformed_uri_is_logged() {
            let logs = warnings(|| {
                scope("age=1", &["age"]).from_uri("not a uri").compile(None);
            });
            assert!(logs.contains("failed to parse query params"));
        }
    }
}
