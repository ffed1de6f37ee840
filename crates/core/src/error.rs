//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic data failures (schema, ranges, shape).
/// Service and workflow failures belong to the crates that produce them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required column is missing, or a cell could not be read as its type.
    #[error("schema error in `{column}`: {reason}")]
    Schema { column: String, reason: String },

    /// A bounded field holds a value outside its declared range.
    #[error("`{field}` = {value} is out of range (expected {expected})")]
    Range {
        field: String,
        value: String,
        expected: &'static str,
    },

    /// A value is structurally invalid (e.g. an empty forecast point).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn schema(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub fn range(field: impl Into<String>, value: impl ToString, expected: &'static str) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            expected,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// True for the "bounded field out of range" class of failure.
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }

    /// True for missing columns and unreadable cells.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}
