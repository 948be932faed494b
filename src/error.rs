use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors raised by the user service and the stores beneath it.
///
/// Handlers match on the kind, never on the message text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("User not found")]
    NotFound,

    #[error("User with this email already exists")]
    DuplicateEmail,

    #[error("Email is already in use")]
    EmailInUse,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return ServiceError::DuplicateEmail;
            }
        }
        ServiceError::Storage(e.to_string())
    }
}

/// HTTP-facing error: a status code plus a `{"error": "..."}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::NotFound => Self::not_found(err.to_string()),
            ServiceError::DuplicateEmail | ServiceError::EmailInUse => {
                Self::conflict(err.to_string())
            }
            ServiceError::Storage(detail) => {
                // Full detail stays server-side; the client gets a generic body.
                error!(error = %detail, "storage failure");
                Self::internal()
            }
            ServiceError::Internal(detail) => {
                error!(error = %detail, "unexpected failure");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let api: ApiError = ServiceError::NotFound.into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.message, "User not found");
    }

    #[test]
    fn email_conflicts_map_to_409() {
        let api: ApiError = ServiceError::DuplicateEmail.into();
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.message, "User with this email already exists");

        let api: ApiError = ServiceError::EmailInUse.into();
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.message, "Email is already in use");
    }

    #[test]
    fn storage_maps_to_500_with_generic_body() {
        let api: ApiError = ServiceError::Storage("connection reset".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Internal server error");
        assert!(!api.message.contains("connection reset"));
    }

    #[test]
    fn sqlx_row_not_found_becomes_storage() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ServiceError::Storage(_)));
    }
}
