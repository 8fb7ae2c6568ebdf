//! The closed catalogue of filter operators.
//!
//! Each operator owns exactly one [`PredicateTemplate`]. A template receives an
//! already quoted column reference and the coerced value, and returns the
//! fragment with `?` placeholders alongside the value to bind. The value is
//! never written into the fragment.
//!
//! | token        | fragment              | bound value        |
//! |--------------|-----------------------|--------------------|
//! | `contains`   | `col LIKE ?`          | `%value%`          |
//! | `eq`         | `col = ?`             | value              |
//! | `neq`        | `col != ?`            | value              |
//! | `gt`         | `col < ?`             | value              |
//! | `gte`        | `col <= ?`            | value              |
//! | `lt`         | `col > ?`             | value              |
//! | `lte`        | `col >= ?`            | value              |
//! | `startswith` | `col LIKE ?`          | `value%`           |
//! | `endswith`   | `col LIKE ?`          | `%value`           |
//! | `in`         | `col IN (?)`          | comma split list   |
//! | `not_in`     | `col NOT IN (?)`      | comma split list   |
//! | `isnull`     | `col IS [NOT] NULL`   | none               |
//!
//! ```rust
//! use sieve_query::{FilterValue, Operator};
//!
//! let op = Operator::resolve("startswith").unwrap();
//! let predicate = op.template()("\"name\"", FilterValue::from("Jo"));
//! assert_eq!(predicate.sql, "\"name\" LIKE ?");
//! assert_eq!(predicate.value, Some(FilterValue::from("Jo%")));
//!
//! assert!(Operator::resolve("has").is_none());
//! ```

use std::fmt;

use crate::filter::FilterValue;

/// A compiled predicate fragment and the value bound to its placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// SQL fragment with `?` placeholders.
    pub sql: String,
    /// Value to bind, absent for operators that carry none.
    pub value: Option<FilterValue>,
}

impl Predicate {
    fn bound(sql: String, value: FilterValue) -> Self {
        Self {
            sql,
            value: Some(value),
        }
    }

    fn unbound(sql: String) -> Self {
        Self { sql, value: None }
    }
}

/// Builds a predicate from a quoted column reference and a coerced value.
pub type PredicateTemplate = fn(&str, FilterValue) -> Predicate;

/// Supported filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `?name__contains=John`
    Contains,
    /// `?name=John` or `?name__eq=John`
    Equals,
    /// `?name__neq=John`
    NotEquals,
    /// `?age__gt=18`
    Greater,
    /// `?age__gte=18`
    GreaterEquals,
    /// `?age__lt=18`
    Lesser,
    /// `?age__lte=18`
    LesserEquals,
    /// `?name__startswith=John`
    StartsWith,
    /// `?name__endswith=John`
    EndsWith,
    /// `?name__in=John,Oliver`
    In,
    /// `?name__not_in=John,Oliver`
    NotIn,
    /// `?deleted_at__isnull=true`
    IsNull,
}

static OPERATORS: [(&str, Operator); 12] = [
    ("contains", Operator::Contains),
    ("eq", Operator::Equals),
    ("neq", Operator::NotEquals),
    ("gt", Operator::Greater),
    ("gte", Operator::GreaterEquals),
    ("lt", Operator::Lesser),
    ("lte", Operator::LesserEquals),
    ("startswith", Operator::StartsWith),
    ("endswith", Operator::EndsWith),
    ("in", Operator::In),
    ("not_in", Operator::NotIn),
    ("isnull", Operator::IsNull),
];

impl Operator {
    /// Look up an operator by its exact query-string token.
    pub fn resolve(name: &str) -> Option<Self> {
        OPERATORS
            .iter()
            .find(|(token, _)| *token == name)
            .map(|(_, op)| *op)
    }

    /// All operators in catalogue order.
    pub fn all() -> impl Iterator<Item = Operator> {
        OPERATORS.iter().map(|(_, op)| *op)
    }

    /// The query-string token for this operator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Equals => "eq",
            Self::NotEquals => "neq",
            Self::Greater => "gt",
            Self::GreaterEquals => "gte",
            Self::Lesser => "lt",
            Self::LesserEquals => "lte",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::IsNull => "isnull",
        }
    }

    /// Whether the compiled predicate binds a value.
    pub fn binds_value(&self) -> bool {
        !matches!(self, Self::IsNull)
    }

    /// The predicate template for this operator.
    pub fn template(&self) -> PredicateTemplate {
        match self {
            Self::Contains => contains,
            Self::Equals => equals,
            Self::NotEquals => not_equals,
            Self::Greater => greater,
            Self::GreaterEquals => greater_equals,
            Self::Lesser => lesser,
            Self::LesserEquals => lesser_equals,
            Self::StartsWith => starts_with,
            Self::EndsWith => ends_with,
            Self::In => in_list,
            Self::NotIn => not_in_list,
            Self::IsNull => is_null,
        }
    }

    /// Apply this operator's template.
    pub fn apply(&self, column: &str, value: FilterValue) -> Predicate {
        (self.template())(column, value)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn contains(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} LIKE ?", column), format!("%{}%", value).into())
}

fn equals(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} = ?", column), value)
}

fn not_equals(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} != ?", column), value)
}

fn greater(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} < ?", column), value)
}

fn greater_equals(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} <= ?", column), value)
}

fn lesser(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} > ?", column), value)
}

fn lesser_equals(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} >= ?", column), value)
}

fn starts_with(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} LIKE ?", column), format!("{}%", value).into())
}

fn ends_with(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} LIKE ?", column), format!("%{}", value).into())
}

fn split_list(value: FilterValue) -> FilterValue {
    match value {
        FilterValue::String(s) => FilterValue::List(s.split(',').map(FilterValue::from).collect()),
        other => other,
    }
}

fn in_list(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} IN (?)", column), split_list(value))
}

fn not_in_list(column: &str, value: FilterValue) -> Predicate {
    Predicate::bound(format!("{} NOT IN (?)", column), split_list(value))
}

fn is_null(column: &str, value: FilterValue) -> Predicate {
    let truthy = match &value {
        FilterValue::Bool(b) => *b,
        FilterValue::String(s) => s == "true" || s == "1",
        _ => false,
    };

    if truthy {
        Predicate::unbound(format!("{} IS NULL", column))
    } else {
        Predicate::unbound(format!("{} IS NOT NULL", column))
    }
}
