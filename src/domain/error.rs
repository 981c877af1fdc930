//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::path::FieldPath;

/// Domain errors signal a structural mismatch between callers and the field tree.
/// Field validation failures are never reported here; they live in the leaf's `ErrorSet`.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("no field at path: {0}")]
    NotFound(FieldPath),

    #[error("field is a group, not a value: {0}")]
    TypeMismatch(FieldPath),

    #[error("validation response references unknown field: {0}")]
    UnknownField(FieldPath),

    #[error("duplicate field in group: {0}")]
    DuplicateField(FieldPath),

    #[error("invalid field path: {0:?}")]
    InvalidPath(String),

    #[error("invalid pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
