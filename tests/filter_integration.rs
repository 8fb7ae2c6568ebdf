//! Integration tests for query-string filtering.
//!
//! These tests verify the filter compiler end to end:
//! - Operator fragments and bound values
//! - Allow-list enforcement
//! - Value coercion from record shapes
//! - Special filter precedence

use pretty_assertions::assert_eq;
use sieve::query::{
    CompiledFilter, DatabaseType, FieldKind, Operator, RecordShape, SelectQuery, SpecialFilters,
};
use sieve::{FilterScope, FilterValue, QueryBuilder, RequestParams, ScopeConfig};

fn shape() -> RecordShape {
    RecordShape::new("TestModel").fields([
        ("id", FieldKind::Number),
        ("name", FieldKind::String),
        ("occupation", FieldKind::String),
        ("age", FieldKind::Number),
        ("verified", FieldKind::Bool),
        ("tag", FieldKind::String),
        ("created_at", FieldKind::Date),
    ])
}

fn mysql() -> ScopeConfig {
    ScopeConfig::default().dialect(DatabaseType::MySQL)
}

fn compile(query: &str) -> CompiledFilter {
    FilterScope::<SelectQuery>::new(["id", "name", "age", "verified", "tag", "created_at"])
        .with_ctx(&RequestParams::from_query(query))
        .with_config(&mysql())
        .compile(Some(&shape()))
}

fn render(scope: FilterScope<SelectQuery>) -> (String, Vec<FilterValue>) {
    SelectQuery::new("test_models")
        .with_db_type(DatabaseType::MySQL)
        .with_model(shape())
        .scope(scope.scope())
        .build_sql()
        .unwrap()
}

/// Test every operator against its fragment and bound value
#[test]
fn test_operator_table() {
    let cases = [
        ("name__contains=ab", "`name` LIKE ?", Some(FilterValue::from("%ab%"))),
        ("name__eq=ab", "`name` = ?", Some(FilterValue::from("ab"))),
        ("name__neq=ab", "`name` != ?", Some(FilterValue::from("ab"))),
        ("age__gt=5", "`age` < ?", Some(FilterValue::from("5"))),
        ("age__gte=5", "`age` <= ?", Some(FilterValue::from("5"))),
        ("age__lt=5", "`age` > ?", Some(FilterValue::from("5"))),
        ("age__lte=5", "`age` >= ?", Some(FilterValue::from("5"))),
        ("name__startswith=ab", "`name` LIKE ?", Some(FilterValue::from("ab%"))),
        ("name__endswith=ab", "`name` LIKE ?", Some(FilterValue::from("%ab"))),
        ("tag__in=a,b", "`tag` IN (?)", Some(FilterValue::from(vec!["a", "b"]))),
        ("tag__not_in=a,b", "`tag` NOT IN (?)", Some(FilterValue::from(vec!["a", "b"]))),
        ("tag__isnull=1", "`tag` IS NULL", None),
    ];
    assert_eq!(cases.len(), Operator::all().count());

    for (query, fragment, value) in cases {
        let compiled = compile(query);
        assert_eq!(compiled.predicates, vec![fragment.to_string()], "{}", query);
        assert_eq!(
            compiled.values,
            value.into_iter().collect::<Vec<_>>(),
            "{}",
            query
        );
    }
}

/// Test values never appear in the SQL text
#[test]
fn test_injection_safety() {
    for op in Operator::all().filter(Operator::binds_value) {
        let query = format!("name__{}=DROP%20TABLE%20users", op);
        let compiled = compile(&query);
        let sql = compiled.where_sql().unwrap();
        assert!(!sql.contains("DROP"), "{}: {}", op, sql);
        assert_eq!(compiled.values.len(), 1);
    }
}

/// Test a bare field is equality
#[test]
fn test_bare_field_is_equality() {
    assert_eq!(compile("name=ab"), compile("name__eq=ab"));
}

/// Test non-allow-listed fields are ignored
#[test]
fn test_non_allow_listed_field_ignored() {
    assert_eq!(compile("occupation=dev&age=3"), compile("age=3"));
    assert_eq!(compile("occupation__contains=dev"), CompiledFilter::default());
}

/// Test invalid operators are ignored
#[test]
fn test_invalid_operator_ignored() {
    assert!(compile("name__has=2").is_empty());
    assert!(compile("name__eq__eq=2").is_empty());
    assert!(compile("name__=2").is_empty());
    assert!(compile("name__EQ=2").is_empty());
}

/// Test the list operators bind the split list
#[test]
fn test_in_binds_list() {
    let (sql, values) = render(
        FilterScope::new(["tag"])
            .with_ctx(&RequestParams::from_query("tag__in=a,b,c"))
            .with_config(&mysql()),
    );
    assert_eq!(sql, "SELECT * FROM `test_models` WHERE `tag` IN (?, ?, ?)");
    assert_eq!(
        values,
        vec![FilterValue::from("a"), FilterValue::from("b"), FilterValue::from("c")]
    );
}

/// Test isnull truthiness
#[test]
fn test_isnull_values() {
    for value in ["true", "1"] {
        let compiled = compile(&format!("name__isnull={}", value));
        assert_eq!(compiled.predicates, vec!["`name` IS NULL"]);
        assert!(compiled.values.is_empty());
    }
    for value in ["false", "0", "yes", ""] {
        let compiled = compile(&format!("name__isnull={}", value));
        assert_eq!(compiled.predicates, vec!["`name` IS NOT NULL"]);
        assert!(compiled.values.is_empty());
    }
}

/// Test boolean fields are coerced
#[test]
fn test_bool_field_coercion() {
    assert_eq!(compile("verified=true").values, vec![FilterValue::Bool(true)]);
    assert_eq!(compile("verified=F").values, vec![FilterValue::Bool(false)]);
    assert!(compile("verified=nope").is_empty());
}

/// Test fields missing from the shape pass through as strings
#[test]
fn test_field_missing_from_shape() {
    let compiled = FilterScope::<SelectQuery>::new(["nickname"])
        .with_ctx(&RequestParams::from_query("nickname=jo"))
        .compile(Some(&shape()));
    assert_eq!(compiled.values, vec![FilterValue::from("jo")]);
}

/// Test special filters take precedence over standard operators
#[test]
fn test_special_filter_precedence() {
    let special = SpecialFilters::new()
        .on("age__neq", |value: &str, query: SelectQuery| {
            let age = value.parse::<i64>().unwrap_or_default();
            query.r#where(
                "`age` != ? AND `age` IS NOT NULL",
                vec![FilterValue::Int(age)],
            )
        })
        .on("q", |value: &str, query: SelectQuery| {
            let pattern = FilterValue::from(format!("%{}%", value));
            query.r#where("`name` LIKE ?", vec![pattern])
        });

    let (sql, values) = render(
        FilterScope::new(["age", "name"])
            .with_ctx(&RequestParams::from_query("name=x&age__neq=1&q=jo&unused=1"))
            .with_config(&mysql())
            .special(special),
    );
    assert_eq!(
        sql,
        "SELECT * FROM `test_models` WHERE (`name` = ?) \
         AND (`age` != ? AND `age` IS NOT NULL) AND (`name` LIKE ?)"
    );
    assert_eq!(
        values,
        vec![FilterValue::from("x"), FilterValue::Int(1), FilterValue::from("%jo%")]
    );
}

/// Test alias qualification
#[test]
fn test_alias() {
    let (sql, _) = render(
        FilterScope::new(["name"])
            .with_ctx(&RequestParams::from_query("name__neq=x"))
            .with_config(&mysql())
            .alias("tm"),
    );
    assert_eq!(sql, "SELECT * FROM `test_models` WHERE `tm`.`name` != ?");
}

/// Test date truncation for temporal fields
#[test]
fn test_force_date() {
    let (sql, values) = render(
        FilterScope::new(["created_at", "age"])
            .with_ctx(&RequestParams::from_query("created_at__gte=2024-05-01&age=3"))
            .with_config(&mysql())
            .force_date(true),
    );
    assert_eq!(
        sql,
        "SELECT * FROM `test_models` WHERE `age` = ? AND DATE(`created_at`) <= ?"
    );
    assert_eq!(values[1], FilterValue::from("2024-05-01"));
}

/// Test parameters sourced from an alternate URI
#[test]
fn test_from_uri() {
    let scope = FilterScope::<SelectQuery>::new(["age"])
        .with_ctx(&RequestParams::from_query("age=1"))
        .from_uri("https://example.com/api/users?age__gt=30&sort=age");
    assert_eq!(scope.compile(None).predicates, vec!["\"age\" < ?"]);

    let scope = FilterScope::<SelectQuery>::new(["age"])
        .with_ctx(&RequestParams::from_query("age=1"))
        .from_uri("::bad");
    assert!(scope.compile(None).is_empty());
}

/// Test placeholders are numbered for PostgreSQL
#[test]
fn test_postgres_placeholders() {
    let query = SelectQuery::new("test_models").scope(
        FilterScope::new(["age", "tag"])
            .with_ctx(&RequestParams::from_query("age__gte=3&tag__not_in=a,b"))
            .scope(),
    );
    let (sql, values) = query.build_sql().unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM \"test_models\" WHERE \"age\" <= $1 AND \"tag\" NOT IN ($2, $3)"
    );
    assert_eq!(values.len(), 3);
}

/// Test fresh scopes produce identical output
#[test]
fn test_idempotence() {
    let query = "tag__in=x,y&name__endswith=z&age__lt=9&verified=1&occupation=dev";
    assert_eq!(compile(query), compile(query));
    assert_eq!(compile(query).predicates.len(), 4);
}
