//! Application error type shared by all layers.
//!
//! Every business outcome that is not a success is a typed [`AppError`]
//! variant. The HTTP adapter renders them as JSON:
//!
//! ```json
//! { "error": { "code": "code_taken", "message": "...", "details": {} } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::utils::db_error::{is_transient, is_unique_violation_on_code};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    InvalidUrl { message: String, details: Value },

    #[error("{message}")]
    InvalidCode { message: String, details: Value },

    #[error("{message}")]
    CodeTaken { message: String, details: Value },

    #[error("{message}")]
    GenerationExhausted { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Flagged { message: String, details: Value },

    #[error("{message}")]
    Forbidden { message: String, details: Value },

    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    StorageUnavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn invalid_url(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidUrl {
            message: message.into(),
            details,
        }
    }

    pub fn invalid_code(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidCode {
            message: message.into(),
            details,
        }
    }

    pub fn code_taken(message: impl Into<String>, details: Value) -> Self {
        Self::CodeTaken {
            message: message.into(),
            details,
        }
    }

    pub fn generation_exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::GenerationExhausted {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn flagged(message: impl Into<String>, details: Value) -> Self {
        Self::Flagged {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }

    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn storage_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "invalid_url",
            Self::InvalidCode { .. } => "invalid_code",
            Self::CodeTaken { .. } => "code_taken",
            Self::GenerationExhausted { .. } => "generation_exhausted",
            Self::NotFound { .. } => "not_found",
            Self::Flagged { .. } => "flagged",
            Self::Forbidden { .. } => "forbidden",
            Self::Validation { .. } => "validation_error",
            Self::StorageUnavailable { .. } => "storage_unavailable",
            Self::Internal { .. } => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidUrl { .. } | Self::InvalidCode { .. } | Self::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::CodeTaken { .. } => StatusCode::CONFLICT,
            Self::GenerationExhausted { .. } | Self::StorageUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Flagged { .. } => StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures the caller may retry later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable { .. } | Self::GenerationExhausted { .. }
        )
    }

    fn details(&self) -> &Value {
        match self {
            Self::InvalidUrl { details, .. }
            | Self::InvalidCode { details, .. }
            | Self::CodeTaken { details, .. }
            | Self::GenerationExhausted { details, .. }
            | Self::NotFound { details, .. }
            | Self::Flagged { details, .. }
            | Self::Forbidden { details, .. }
            | Self::Validation { details, .. }
            | Self::StorageUnavailable { details, .. }
            | Self::Internal { details, .. } => details,
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code(),
            message: self.to_string(),
            details: self.details().clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if is_unique_violation_on_code(&e) {
            return AppError::code_taken("Short code is already in use", json!({}));
        }

        if is_transient(&e) {
            return AppError::storage_unavailable(
                "Storage is temporarily unavailable",
                json!({ "reason": e.to_string() }),
            );
        }

        tracing::error!(error = %e, "Database error");
        AppError::internal("Database error", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&e).unwrap_or(Value::Null);
        AppError::bad_request("Request validation failed", details)
    }
}
