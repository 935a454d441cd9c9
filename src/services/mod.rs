//! Business rules for buckets and items.
//!
//! Every public service method returns [`ServiceResult`]. Failures are logged
//! once, at the service boundary: broken business rules at `warn`, store
//! failures at `error`, and validation failures at `debug` (they never reach
//! the database).

pub mod bucket_service;
pub mod capacity;
pub mod item_service;
pub mod validation;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single field-level constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Discriminant of [`ServiceError`], for callers that only need to branch on
/// the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    BucketNotFound,
    BucketFull,
    BucketNotEmpty,
    ItemNotFound,
    StoreFailure,
}

impl ErrorKind {
    /// Short rule name surfaced to API clients.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::BucketNotFound => "bucket_not_found",
            ErrorKind::BucketFull => "bucket_full",
            ErrorKind::BucketNotEmpty => "bucket_not_empty",
            ErrorKind::ItemNotFound => "item_not_found",
            ErrorKind::StoreFailure => "store_failure",
        }
    }

    /// Expected outcomes of a well-formed request against the current data.
    pub fn is_business_rule(self) -> bool {
        matches!(
            self,
            ErrorKind::BucketNotFound
                | ErrorKind::BucketFull
                | ErrorKind::BucketNotEmpty
                | ErrorKind::ItemNotFound
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),
    #[error("bucket `{0}` not found")]
    BucketNotFound(i64),
    #[error("bucket `{0}` is full")]
    BucketFull(i64),
    #[error("bucket `{0}` is not empty")]
    BucketNotEmpty(i64),
    #[error("item `{0}` not found")]
    ItemNotFound(i64),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::BucketNotFound(_) => ErrorKind::BucketNotFound,
            ServiceError::BucketFull(_) => ErrorKind::BucketFull,
            ServiceError::BucketNotEmpty(_) => ErrorKind::BucketNotEmpty,
            ServiceError::ItemNotFound(_) => ErrorKind::ItemNotFound,
            ServiceError::Store(_) => ErrorKind::StoreFailure,
        }
    }

    /// Emit this error at the level its kind calls for.
    pub fn log(&self) {
        let kind = self.kind();
        match kind {
            ErrorKind::Validation => tracing::debug!(kind = %kind, "{}", self),
            ErrorKind::StoreFailure => tracing::error!(kind = %kind, "{}", self),
            _ => tracing::warn!(kind = %kind, "{}", self),
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
