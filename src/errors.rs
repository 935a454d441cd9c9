use crate::services::{ErrorKind, ServiceError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// An HTTP-facing error: status, a short rule name, and the messages safe to
/// show a client.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
    pub messages: Vec<String>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, error: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: msg.into(),
            messages: Vec::new(),
        }
    }

    /// Shortcut for a 500 Internal Server Error. The cause stays in the logs.
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::StoreFailure.as_str(),
            "internal server error",
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let kind = err.kind();
        match err {
            ServiceError::Validation(violations) => AppError {
                status: StatusCode::BAD_REQUEST,
                error: kind.as_str(),
                message: "invalid request".into(),
                messages: violations.iter().map(ToString::to_string).collect(),
            },
            ServiceError::ItemNotFound(_) => {
                AppError::new(StatusCode::NOT_FOUND, kind.as_str(), err.to_string())
            }
            ServiceError::BucketNotFound(_)
            | ServiceError::BucketFull(_)
            | ServiceError::BucketNotEmpty(_) => {
                AppError::new(StatusCode::BAD_REQUEST, kind.as_str(), err.to_string())
            }
            ServiceError::Store(_) => AppError::internal(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "message": self.message,
            "status": self.status.as_u16()
        });
        if !self.messages.is_empty() {
            body["messages"] = json!(self.messages);
        }

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::FieldViolation;

    #[test]
    fn validation_maps_to_bad_request_with_every_message() {
        let err = AppError::from(ServiceError::Validation(vec![
            FieldViolation::new("name", "is required"),
            FieldViolation::new("capacity", "must be greater than 0"),
        ]));

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error, "validation");
        assert_eq!(
            err.messages,
            vec!["name: is required", "capacity: must be greater than 0"]
        );
    }

    #[test]
    fn business_rules_keep_their_names() {
        let full = AppError::from(ServiceError::BucketFull(3));
        assert_eq!(full.status, StatusCode::BAD_REQUEST);
        assert_eq!(full.error, "bucket_full");
        assert_eq!(full.message, "bucket `3` is full");

        let missing = AppError::from(ServiceError::ItemNotFound(9));
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.error, "item_not_found");
    }

    #[test]
    fn store_failures_hide_details() {
        let err = AppError::from(ServiceError::Store(sqlx::Error::Protocol(
            "disk I/O error at /var/lib/secret.db".into(),
        )));

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal server error");
        assert!(err.messages.is_empty());
    }
}
