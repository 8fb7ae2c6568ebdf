//! SQL dialect helpers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;

/// Target SQL dialect, deciding identifier quoting and placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// PostgreSQL uses $1, $2, etc.
    #[default]
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    SQLite,
}

impl DatabaseType {
    /// Get the parameter placeholder for this database type.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MySQL | Self::SQLite => "?".to_string(),
        }
    }

    /// The identifier quote character.
    pub fn quote_char(&self) -> char {
        match self {
            Self::MySQL => '`',
            Self::PostgreSQL | Self::SQLite => '"',
        }
    }

    /// Quote an identifier, doubling any embedded quote characters.
    pub fn quote(&self, name: &str) -> String {
        let q = self.quote_char();
        let escaped = name.replace(q, &format!("{}{}", q, q));
        format!("{}{}{}", q, escaped, q)
    }

    /// Quote an identifier and prefix it with a quoted table alias, if any.
    pub fn qualify(&self, alias: Option<&str>, name: &str) -> String {
        match alias {
            Some(alias) if !alias.is_empty() => {
                format!("{}.{}", self.quote(alias), self.quote(name))
            }
            _ => self.quote(name),
        }
    }

    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
        }
    }
}

impl FromStr for DatabaseType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::PostgreSQL),
            "mysql" | "mariadb" => Ok(Self::MySQL),
            "sqlite" => Ok(Self::SQLite),
            other => Err(QueryError::invalid_configuration(format!(
                "unknown dialect '{}'",
                other
            ))
            .with_suggestion("use one of: postgresql, mysql, sqlite")),
        }
    }
}

/// Rewrite the `?` placeholders of `fragment` into `db_type` placeholders.
///
/// Placeholders inside quoted identifiers or string literals are left alone.
/// A list value expands to one placeholder per element, and an empty list
/// renders as `NULL`. Consumed values are appended to `out` in order.
pub fn bind_placeholders(
    fragment: &str,
    values: &[FilterValue],
    db_type: DatabaseType,
    out: &mut Vec<FilterValue>,
) -> QueryResult<String> {
    let mut sql = String::with_capacity(fragment.len() + values.len() * 2);
    let mut values = values.iter();
    let mut quote: Option<char> = None;

    for c in fragment.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                sql.push(c);
            }
            (Some(_), c) => sql.push(c),
            (None, '"' | '`' | '\'') => {
                quote = Some(c);
                sql.push(c);
            }
            (None, '?') => {
                let value = values.next().ok_or_else(|| {
                    QueryError::invalid_parameter(format!(
                        "fragment has more placeholders than bound values: {}",
                        fragment
                    ))
                })?;
                push_value(&mut sql, value, db_type, out);
            }
            (None, c) => sql.push(c),
        }
    }

    if values.next().is_some() {
        return Err(QueryError::invalid_parameter(format!(
            "fragment has fewer placeholders than bound values: {}",
            fragment
        )));
    }

    Ok(sql)
}

fn push_value(
    sql: &mut String,
    value: &FilterValue,
    db_type: DatabaseType,
    out: &mut Vec<FilterValue>,
) {
    match value {
        FilterValue::List(items) if items.is_empty() => sql.push_str("NULL"),
        FilterValue::List(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                out.push(item.clone());
                sql.push_str(&db_type.placeholder(out.len()));
            }
        }
        other => {
            out.push(other.clone());
            sql.push_str(&db_type.placeholder(out.len()));
        }
    }
}
