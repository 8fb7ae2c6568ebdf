//! Classification of query keys into filter tokens.

use crate::operator::Operator;

const SEPARATOR: &str = "__";

/// What a query key asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterToken<'a> {
    /// Key registered in the special-filter map, matched verbatim.
    Special(&'a str),
    /// Standard `field` or `field__operator` filter on an allow-listed field.
    Field {
        /// The allow-listed field name.
        field: &'a str,
        /// The resolved operator.
        operator: Operator,
    },
}

impl<'a> FilterToken<'a> {
    /// Classify a query key.
    ///
    /// Returns `None` for keys that name no allow-listed field, carry an
    /// unknown operator, or do not contain exactly one `__` separator.
    pub fn classify<S: AsRef<str>>(
        key: &'a str,
        fields: &[S],
        is_special: impl FnOnce(&str) -> bool,
    ) -> Option<Self> {
        if is_special(key) {
            return Some(Self::Special(key));
        }

        let allowed = |name: &str| fields.iter().any(|f| f.as_ref() == name);

        if allowed(key) {
            return Some(Self::Field {
                field: key,
                operator: Operator::Equals,
            });
        }

        let (field, op) = key.split_once(SEPARATOR)?;
        if op.contains(SEPARATOR) || !allowed(field) {
            return None;
        }

        Operator::resolve(op).map(|operator| Self::Field { field, operator })
    }
}
