//! Core error and response types

use super::{ErrorCategory, ErrorCode};
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Application error type
///
/// Carries a unified error code, a human-readable message, and optional
/// structured details (e.g. per-field validation failures).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code
    pub code: ErrorCode,
    /// Message shown to the caller
    pub message: String,
    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

impl AppError {
    /// Create a new error with the default message for the code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.message().to_string(),
            details: None,
        }
    }

    /// Error with a message overriding the code's default
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured details to this error
    pub fn with_details(mut self, details: HashMap<String, serde_json::Value>) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach a single detail entry to this error
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the category of this error
    pub const fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code)
    }

    /// Get the HTTP status for this error
    pub fn http_status(&self) -> http::StatusCode {
        self.code.http_status()
    }

    // ==================== Shorthand constructors ====================

    /// Validation failed with a custom message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, message)
    }

    /// Validation failed with per-field error messages
    ///
    /// Each entry maps a field name to the reason it was rejected. All
    /// violated fields should be reported at once, not just the first.
    pub fn validation_fields(fields: HashMap<String, serde_json::Value>) -> Self {
        Self::new(ErrorCode::ValidationFailed).with_details(fields)
    }

    /// Resource not found with an entity description
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, format!("{} not found", entity.into()))
    }

    /// No usable identity on the request
    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Invalid login credentials
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// Authenticated but not allowed to do this
    pub fn permission_denied() -> Self {
        Self::new(ErrorCode::PermissionDenied)
    }

    /// Malformed or unverifiable token
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, message)
    }

    /// Token past its expiry
    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    /// Student not found by id
    pub fn student_not_found(id: impl Into<String>) -> Self {
        Self::new(ErrorCode::StudentNotFound).detail("id", id.into())
    }

    /// Payment record not found by id
    pub fn payment_record_not_found(id: impl Into<String>) -> Self {
        Self::new(ErrorCode::PaymentRecordNotFound).detail("id", id.into())
    }

    /// Payment would push paid amount past the total owed
    pub fn overpayment(amount: f64, remaining: f64) -> Self {
        Self::new(ErrorCode::Overpayment)
            .detail("amount", amount)
            .detail("remaining", remaining)
    }

    /// Internal server error with a custom message
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, message)
    }

    /// Database error with a custom message
    pub fn database(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, message)
    }
}

impl From<ErrorCode> for AppError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

/// Result alias for handler and service functions
pub type AppResult<T> = Result<T, AppError>;

/// Standard API response envelope
///
/// Success responses carry `data`; error responses carry `code`,
/// `message` and optionally `details`. Fields that are `None` are
/// omitted from the JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Error code (omitted on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Error or status message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Structured error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

impl<T> ApiResponse<T> {
    /// Build a success response wrapping `data`
    pub fn success(data: T) -> Self {
        Self {
            code: None,
            message: None,
            data: Some(data),
            details: None,
        }
    }

    /// Build a success response with a message and no payload
    pub fn success_message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: Some(message.into()),
            data: None,
            details: None,
        }
    }

    /// Build an error response from an [`AppError`]
    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: Some(err.message.clone()),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.code.http_status();

        // System errors indicate something broke server-side, log them loudly.
        // Everything else is expected request-level noise.
        match self.category() {
            ErrorCategory::System => {
                tracing::error!(code = %self.code, message = %self.message, "server error");
            }
            _ => {
                tracing::debug!(code = %self.code, message = %self.message, "request error");
            }
        }

        let body = Json(ApiResponse::<()>::error(&self));
        (status, body).into_response()
    }
}
