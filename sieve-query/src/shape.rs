//! Record shapes and value coercion.
//!
//! A [`RecordShape`] is the field-descriptor table of the record a query
//! targets. Sieve never inspects record types at runtime. The caller declares
//! each field's [`FieldKind`] once and the query builder hands the shape to the
//! filter compiler through [`QueryBuilder::model`](crate::QueryBuilder::model).
//!
//! Field names are normalized to UpperCamelCase on both insert and lookup, so
//! `created_at`, `createdAt` and `CreatedAt` all name the same field.
//!
//! ```rust
//! use sieve_query::{FieldKind, FilterValue, RecordShape, shape::coerce};
//!
//! let shape = RecordShape::new("TestModel")
//!     .field("name", FieldKind::String)
//!     .field("active", FieldKind::Bool);
//!
//! assert_eq!(coerce(Some(&shape), "active", "true").unwrap(), FilterValue::Bool(true));
//! assert_eq!(coerce(Some(&shape), "name", "true").unwrap(), FilterValue::from("true"));
//! assert!(coerce(Some(&shape), "active", "maybe").is_err());
//! assert_eq!(coerce(None, "active", "maybe").unwrap(), FilterValue::from("maybe"));
//! ```

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;

/// Declared semantic kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Text; values pass through unchanged.
    String,
    /// Boolean; values are parsed.
    Bool,
    /// Numeric; the query layer adapts the text value.
    Number,
    /// Date or timestamp; eligible for date truncation.
    Date,
}

/// Field-descriptor table for one record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordShape {
    name: String,
    fields: IndexMap<String, FieldKind>,
}

impl RecordShape {
    /// Create an empty shape for the named record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Declare a field.
    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.insert(normalize(name), kind);
        self
    }

    /// Declare several fields.
    pub fn fields<'a>(mut self, fields: impl IntoIterator<Item = (&'a str, FieldKind)>) -> Self {
        for (name, kind) in fields {
            self.fields.insert(normalize(name), kind);
        }
        self
    }

    /// The record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a field's kind.
    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(&normalize(field)).copied()
    }

    /// Whether the field is declared as a date or timestamp.
    pub fn is_temporal(&self, field: &str) -> bool {
        self.kind_of(field) == Some(FieldKind::Date)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Coerce a raw query value according to the field's declared kind.
    pub fn coerce(&self, field: &str, raw: &str) -> QueryResult<FilterValue> {
        match self.kind_of(field) {
            Some(FieldKind::Bool) => parse_bool(raw)
                .map(FilterValue::Bool)
                .ok_or_else(|| QueryError::invalid_data_type(field, "bool", raw)),
            Some(_) => Ok(FilterValue::from(raw)),
            None => {
                warn!(
                    model = %self.name,
                    field = %normalize(field),
                    "field not found on record shape"
                );
                Ok(FilterValue::from(raw))
            }
        }
    }
}

/// Coerce a raw value, passing it through as a string when no shape is known.
pub fn coerce(shape: Option<&RecordShape>, field: &str, raw: &str) -> QueryResult<FilterValue> {
    match shape {
        Some(shape) => shape.coerce(field, raw),
        None => Ok(FilterValue::from(raw)),
    }
}

/// Wrap a column reference so it compares by calendar date.
pub fn date_truncate(column: &str) -> String {
    format!("DATE({})", column)
}

fn normalize(field: &str) -> String {
    field.to_case(Case::UpperCamel)
}

/// Parse the boolean spellings accepted in query strings.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
