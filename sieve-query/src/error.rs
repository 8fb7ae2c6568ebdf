//! Error types for scope configuration and filter compilation.
//!
//! Most malformed client input never becomes an error: unknown fields and
//! operators are dropped while compiling. The errors here cover the cases a
//! caller can observe or log:
//! - values that cannot be coerced to a field's declared kind
//! - unparseable alternate URIs
//! - scopes used without the request context they require
//! - invalid configuration
//!
//! # Error Codes
//!
//! Error codes follow a pattern: S{category}{number}
//! - 5xxx: Parameter errors
//! - 6xxx: Data errors
//! - 7xxx: Configuration errors
//!
//! ```rust
//! use sieve_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::missing_configuration("SortScope request context");
//! assert_eq!(err.code, ErrorCode::MissingConfiguration);
//! assert!(err.to_string().starts_with("[S7002]"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for scope operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Parameter errors (5xxx)
    /// Invalid parameter or parameter source (S5003).
    InvalidParameter = 5003,

    // Data errors (6xxx)
    /// Value does not match the field's declared kind (S6001).
    InvalidDataType = 6001,

    // Configuration errors (7xxx)
    /// Invalid configuration (S7001).
    InvalidConfiguration = 7001,
    /// Missing configuration (S7002).
    MissingConfiguration = 7002,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S6001").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidParameter => "Invalid parameter",
            Self::InvalidDataType => "Invalid data type",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::MissingConfiguration => "Missing configuration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while building query scopes.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParameter, message)
    }

    /// Create an error for a value that does not fit its field's kind.
    pub fn invalid_data_type(field: impl Into<String>, expected: &str, value: &str) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidDataType,
            format!("cannot convert {:?} to {} for field '{}'", value, expected, field),
        )
        .with_field(&field)
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    /// Create a missing configuration error.
    pub fn missing_configuration(what: impl Into<String>) -> Self {
        let what = what.into();
        Self::new(ErrorCode::MissingConfiguration, format!("{} is not set", what))
            .with_help("bind the request parameters before building the scope")
    }

    // ============== Error Type Checks ==============

    /// Check if this is a data type error.
    pub fn is_data_type_error(&self) -> bool {
        self.code == ErrorCode::InvalidDataType
    }

    /// Check if this is a configuration error.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidConfiguration | ErrorCode::MissingConfiguration
        )
    }

    /// Display the error with its context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = format!("{}: {}", self.code.description(), self);

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("\n  operation: {}", op));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("\n  field: {}", field));
        }
        for suggestion in &self.context.suggestions {
            output.push_str(&format!("\n  suggestion: {}", suggestion));
        }
        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\n  help: {}", help));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::InvalidDataType.code(), "S6001");
        assert_eq!(ErrorCode::MissingConfiguration.to_string(), "S7002");
    }

    #[test]
    fn test_constructor_codes() {
        let cases = [
            (QueryError::invalid_parameter("uri"), "S5003"),
            (QueryError::invalid_data_type("a", "bool", "x"), "S6001"),
            (QueryError::invalid_configuration("page_size"), "S7001"),
            (QueryError::missing_configuration("context"), "S7002"),
        ];
        for (err, code) in cases {
            assert_eq!(err.code.code(), code);
            assert!(err.to_string().starts_with(&format!("[{}]", code)));
        }
    }

    #[test]
    fn test_invalid_data_type() {
        let err = QueryError::invalid_data_type("active", "bool", "maybe");
        assert!(err.is_data_type_error());
        assert_eq!(err.context.field.as_deref(), Some("active"));
        assert!(err.to_string().contains("\"maybe\""));
    }

    #[test]
    fn test_missing_configuration() {
        let err = QueryError::missing_configuration("SortScope request context");
        assert!(err.is_configuration_error());
        assert!(err.display_full().contains("help:"));
    }

    #[test]
    fn test_with_source() {
        let parse = "x".parse::<u64>().unwrap_err();
        let err = QueryError::invalid_configuration("SIEVE_PAGE_SIZE must be an integer")
            .with_source(parse);
        assert!(std::error::Error::source(&err).is_some());
    }
}
