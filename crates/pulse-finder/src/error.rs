//! Error types for the finder crate.

use thiserror::Error;

/// Errors raised while validating criteria, loading field specs or
/// serializing results.
///
/// Every validation error is raised before any item of the collection is
/// examined, so a query either fails up front or runs to completion.
#[derive(Debug, Error)]
pub enum FinderError {
    /// A filter or sort key names a field the field spec does not declare.
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    /// A range filter whose lower bound is above its upper bound.
    #[error("invalid range for '{field}': min {min} is greater than max {max}")]
    InvalidRange {
        field: String,
        min: String,
        max: String,
    },

    /// A sort direction other than `asc` or `desc`.
    #[error("invalid sort direction '{direction}' for '{field}', expected 'asc' or 'desc'")]
    InvalidSortDirection { field: String, direction: String },

    /// The filter value does not fit the kind declared for the field.
    #[error("filter on '{field}' expects {expected}")]
    FilterMismatch {
        field: String,
        expected: &'static str,
    },

    /// A registry lookup for an entity type that was never declared.
    #[error("unknown entity type '{entity}'")]
    UnknownEntity { entity: String },

    /// Malformed YAML catalog.
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed JSON criteria, catalog or record serialization failure.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}

impl FinderError {
    pub(crate) fn unknown_field(field: &str) -> Self {
        FinderError::UnknownField {
            field: field.to_string(),
        }
    }

    pub(crate) fn mismatch(field: &str, expected: &'static str) -> Self {
        FinderError::FilterMismatch {
            field: field.to_string(),
            expected,
        }
    }
}

/// Result type for finder operations.
pub type Result<T> = std::result::Result<T, FinderError>;
