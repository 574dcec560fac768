//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler -> Result<T, ApiError>                                        │
//! │       │                                                                 │
//! │       ├── ValidationError ──────────────► 422 VALIDATION_ERROR         │
//! │       ├── bad JSON / query string ──────► 400 VALIDATION_ERROR         │
//! │       ├── DbError::NotFound ────────────► 404 NOT_FOUND                │
//! │       ├── DbError::Conflict ────────────► 409 STORE_CONFLICT           │
//! │       ├── DbError::Unavailable ─────────► 503 STORE_UNAVAILABLE        │
//! │       └── anything else ────────────────► 500 INTERNAL                 │
//! │                                                                         │
//! │  Body: { "code": "NOT_FOUND", "message": "Drug not found: 42" }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only `STORE_UNAVAILABLE` is worth retrying unchanged.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use rxdict_core::ValidationError;
use rxdict_db::export::ExportError;
use rxdict_db::DbError;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    #[serde(skip)]
    status: StatusCode,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    StoreUnavailable,
    StoreConflict,
    Internal,
}

impl ErrorCode {
    fn default_status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::StoreConflict => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error with the code's default status.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            status: code.default_status(),
        }
    }

    /// Malformed request (unparseable JSON or query string).
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            ..ApiError::new(ErrorCode::ValidationError, message)
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::new(ErrorCode::ValidationError, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::Validation(e) => e.into(),
            DbError::Conflict { .. } => ApiError::new(ErrorCode::StoreConflict, err.to_string()),
            DbError::Unavailable(_) => ApiError::new(ErrorCode::StoreUnavailable, err.to_string()),
            other => {
                error!(error = %other, "Store operation failed");
                ApiError::internal("Internal database error")
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Store(e) => e.into(),
            other => {
                error!(error = %other, "CSV export failed");
                ApiError::internal("Export failed")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rxdict_core::DrugField;

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Drug", "42").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Drug not found: 42");

        let err: ApiError = DbError::Unavailable("database is locked".to_string()).into();
        assert_eq!(err.code, ErrorCode::StoreUnavailable);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err: ApiError = DbError::Conflict {
            field: "drugs.id".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::QueryFailed("syntax error".to_string()).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "Internal database error");
    }

    #[test]
    fn test_validation_mapping() {
        let err: ApiError = ValidationError::MissingRequiredField {
            field: DrugField::Manufacturer,
        }
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message, "manufacturer is required");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::bad_request("bad json")).unwrap();
        assert_eq!(json, serde_json::json!({"code": "VALIDATION_ERROR", "message": "bad json"}));
    }
}
