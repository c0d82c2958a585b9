//! Maps domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::ValidationErrors;

use rollcall_attendance::VerificationError;
use rollcall_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error type returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// A domain or infrastructure error.
    App(AppError),
    /// A rejected check-in.
    Verification(VerificationError),
    /// Request body failed validation.
    Invalid(ValidationErrors),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<VerificationError> for ApiError {
    fn from(err: VerificationError) -> Self {
        Self::Verification(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        Self::Invalid(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::App(err) => app_error_response(err),
            Self::Verification(err) => verification_error_response(err),
            Self::Invalid(errors) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse {
                    error: "VALIDATION_ERROR".to_string(),
                    message: "Request validation failed".to_string(),
                    details: serde_json::to_value(&errors).ok(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

fn app_error_response(err: AppError) -> (StatusCode, ApiErrorResponse) {
    let (status, code) = match err.kind {
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ErrorKind::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        ErrorKind::Database | ErrorKind::ServiceUnavailable => {
            error!(error = %err, "Store unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
        }
        ErrorKind::Internal | ErrorKind::Configuration | ErrorKind::Serialization => {
            error!(error = %err, "Internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };

    // Infrastructure detail stays in the logs.
    let message = match status {
        StatusCode::SERVICE_UNAVAILABLE => "Service temporarily unavailable".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
        _ => err.message,
    };

    (
        status,
        ApiErrorResponse {
            error: code.to_string(),
            message,
            details: None,
        },
    )
}

fn verification_error_response(err: VerificationError) -> (StatusCode, ApiErrorResponse) {
    let status = match &err {
        VerificationError::MalformedToken => StatusCode::BAD_REQUEST,
        VerificationError::SessionNotFound => StatusCode::NOT_FOUND,
        VerificationError::TokenExpired | VerificationError::TokenStale => StatusCode::GONE,
        VerificationError::SessionClosed
        | VerificationError::LocationRequired
        | VerificationError::OutOfRange { .. } => StatusCode::FORBIDDEN,
        // Handlers answer duplicates with a 200; this arm only covers misuse.
        VerificationError::AlreadyRecorded => StatusCode::CONFLICT,
        VerificationError::PersistenceFailure(source) => {
            error!(error = %source, "Check-in failed on store error");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let mut details = serde_json::json!({ "outcome": err.class() });
    if let VerificationError::OutOfRange {
        distance_meters,
        radius_meters,
    } = &err
    {
        details["distance_meters"] = serde_json::json!(distance_meters.round());
        details["radius_meters"] = serde_json::json!(radius_meters);
    }

    (
        status,
        ApiErrorResponse {
            error: err.code().to_string(),
            message: err.user_message().to_string(),
            details: Some(details),
        },
    )
}
