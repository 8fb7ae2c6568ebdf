//! The query-builder seam the scopes write into.
//!
//! Scopes never execute SQL. They call [`QueryBuilder`] methods on whatever
//! builder the application uses. [`SelectQuery`] is a small builder that
//! renders a parameterized `SELECT` and is what the tests run against.
//!
//! ```rust
//! use sieve_query::{DatabaseType, FilterValue, OrderByField, QueryBuilder, SelectQuery};
//!
//! let query = SelectQuery::new("users")
//!     .r#where("\"age\" = ?", vec![FilterValue::Int(22)])
//!     .order_by(OrderByField::desc("\"name\""))
//!     .take(20);
//!
//! let (sql, params) = query.build_sql().unwrap();
//! assert_eq!(sql, "SELECT * FROM \"users\" WHERE \"age\" = $1 ORDER BY \"name\" DESC LIMIT 20");
//! assert_eq!(params, vec![FilterValue::Int(22)]);
//! ```

use crate::error::QueryResult;
use crate::filter::FilterValue;
use crate::pagination::Pagination;
use crate::shape::RecordShape;
use crate::sql::{DatabaseType, bind_placeholders};
use crate::types::OrderByField;

/// Builder methods the filter, sort and page scopes rely on.
///
/// Every method takes the builder by value and returns it, so scopes compose
/// as `FnOnce(Q) -> Q`.
pub trait QueryBuilder: Sized {
    /// Shape of the record this query targets, if known.
    fn model(&self) -> Option<&RecordShape>;

    /// Add a WHERE condition with `?` placeholders. Conditions accumulate
    /// with AND.
    fn r#where(self, sql: impl Into<String>, values: Vec<FilterValue>) -> Self;

    /// Append an ORDER BY column.
    fn order_by(self, field: OrderByField) -> Self;

    /// Skip a number of rows.
    fn skip(self, n: u64) -> Self;

    /// Take at most a number of rows.
    fn take(self, n: u64) -> Self;
}

/// A `SELECT * FROM table` query assembled from scope output.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    db_type: DatabaseType,
    model: Option<RecordShape>,
    conditions: Vec<(String, Vec<FilterValue>)>,
    order_by: Vec<OrderByField>,
    pagination: Pagination,
}

impl SelectQuery {
    /// Create a query over a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            db_type: DatabaseType::default(),
            model: None,
            conditions: Vec::new(),
            order_by: Vec::new(),
            pagination: Pagination::new(),
        }
    }

    /// Set the dialect used when rendering.
    pub fn with_db_type(mut self, db_type: DatabaseType) -> Self {
        self.db_type = db_type;
        self
    }

    /// Attach the record shape of the target table.
    pub fn with_model(mut self, model: RecordShape) -> Self {
        self.model = Some(model);
        self
    }

    /// Apply a scope.
    pub fn scope(self, scope: impl FnOnce(Self) -> Self) -> Self {
        scope(self)
    }

    /// WHERE conditions added so far.
    pub fn conditions(&self) -> &[(String, Vec<FilterValue>)] {
        &self.conditions
    }

    /// ORDER BY columns added so far.
    pub fn orderings(&self) -> &[OrderByField] {
        &self.order_by
    }

    /// The current pagination.
    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Render the SQL and the flattened parameter list.
    pub fn build_sql(&self) -> QueryResult<(String, Vec<FilterValue>)> {
        let mut params = Vec::new();
        let mut sql = String::from("SELECT * FROM ");
        sql.push_str(&self.db_type.quote(&self.table));

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            let wrap = self.conditions.len() > 1;
            for (i, (condition, values)) in self.conditions.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" AND ");
                }
                let bound = bind_placeholders(condition, values, self.db_type, &mut params)?;
                if wrap {
                    sql.push('(');
                    sql.push_str(&bound);
                    sql.push(')');
                } else {
                    sql.push_str(&bound);
                }
            }
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, field) in self.order_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                field.write_sql(&mut sql);
            }
        }

        if !self.pagination.is_empty() {
            sql.push(' ');
            self.pagination.write_sql(&mut sql);
        }

        Ok((sql, params))
    }
}

impl QueryBuilder for SelectQuery {
    fn model(&self) -> Option<&RecordShape> {
        self.model.as_ref()
    }

    fn r#where(mut self, sql: impl Into<String>, values: Vec<FilterValue>) -> Self {
        self.conditions.push((sql.into(), values));
        self
    }

    fn order_by(mut self, field: OrderByField) -> Self {
        self.order_by.push(field);
        self
    }

    fn skip(mut self, n: u64) -> Self {
        self.pagination = self.pagination.skip(n);
        self
    }

    fn take(mut self, n: u64) -> Self {
        self.pagination = self.pagination.take(n);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::FieldKind;

    #[test]
    fn test_bare_select() {
        let (sql, params) = SelectQuery::new("test_models").build_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM \"test_models\"");
        assert!(params.is_empty());
    }

    #[test]
    fn test_multiple_conditions_are_wrapped() {
        let query = SelectQuery::new("test_models")
            .r#where("\"age\" != ?", vec![FilterValue::Int(1)])
            .r#where("\"name\" IN (?)", vec![FilterValue::from(vec!["a", "b"])]);

        let (sql, params) = query.build_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM \"test_models\" WHERE (\"age\" != $1) AND (\"name\" IN ($2, $3))"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_mysql_rendering() {
        let query = SelectQuery::new("test_models")
            .with_db_type(DatabaseType::MySQL)
            .r#where("`age` = ?", vec![FilterValue::Int(22)])
            .skip(20)
            .take(10);

        let (sql, _) = query.build_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM `test_models` WHERE `age` = ? LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_model_is_exposed() {
        let shape = RecordShape::new("T").field("a", FieldKind::Bool);
        let query = SelectQuery::new("t").with_model(shape);
        assert_eq!(query.model().and_then(|m| m.kind_of("a")), Some(FieldKind::Bool));
        assert!(SelectQuery::new("t").model().is_none());
    }

    #[test]
    fn test_placeholder_mismatch_is_an_error() {
        let query = SelectQuery::new("t")
            .r#where("a = ? AND b = ?", vec![FilterValue::Int(1)]);
        assert!(query.build_sql().is_err());
    }
}
