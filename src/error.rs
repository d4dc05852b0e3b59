//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1004,
///     "message": "invalid package type: Yoga Retreat",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges below).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                 |
/// |-----------|---------------------|-----------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request             |
/// | 2000–2999 | State/Authorization | 404 / 403 / 409             |
/// | 3000–3999 | Server              | 500 Internal Server Error   |
/// | 4000–4999 | Scheduling rules    | 422 Unprocessable Entity    |
/// | 5000–5999 | Upstream calendar   | 502 Bad Gateway             |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Webhook signature did not match the shared secret.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Webhook payload is missing a required metadata field.
    #[error("missing webhook metadata: {0}")]
    MissingMetadata(String),

    /// Package type is not on the fixed allow-list.
    #[error("invalid package type: {0}")]
    InvalidPackageType(String),

    /// Session with the given ID was not found.
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    /// User profile with the given ID was not found.
    #[error("user not found: {0}")]
    UserNotFound(uuid::Uuid),

    /// Caller is not the trainer assigned to the session.
    #[error("caller is not the session's trainer")]
    NotSessionTrainer,

    /// Caller is not the client booked on the session.
    #[error("caller is not the session's client")]
    NotSessionClient,

    /// Caller lacks the role required for an administrative operation.
    #[error("operation requires trainer or admin role")]
    RoleRequired,

    /// Reschedule response attempted when no proposal is pending.
    #[error("session has no pending reschedule proposal")]
    RescheduleNotPending,

    /// Reschedule proposed within 24 hours of the session start.
    #[error("session starts in less than 24 hours; reschedule window closed")]
    RescheduleWindowClosed,

    /// Proposed time is not strictly in the future.
    #[error("proposed time must be in the future")]
    ProposedTimeInPast,

    /// Calendar provider API returned an error.
    #[error("calendar api error: {0}")]
    CalendarApi(String),

    /// OAuth token refresh against the provider failed.
    #[error("token refresh failed: {0}")]
    TokenRefresh(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidSignature => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::MissingMetadata(_) => 1003,
            Self::InvalidPackageType(_) => 1004,
            Self::SessionNotFound(_) => 2001,
            Self::UserNotFound(_) => 2002,
            Self::NotSessionTrainer => 2101,
            Self::NotSessionClient => 2102,
            Self::RoleRequired => 2103,
            Self::RescheduleNotPending => 2201,
            Self::RescheduleWindowClosed => 4001,
            Self::ProposedTimeInPast => 4002,
            Self::CalendarApi(_) => 5001,
            Self::TokenRefresh(_) => 5002,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSignature
            | Self::InvalidRequest(_)
            | Self::MissingMetadata(_)
            | Self::InvalidPackageType(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) | Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::NotSessionTrainer | Self::NotSessionClient | Self::RoleRequired => {
                StatusCode::FORBIDDEN
            }
            Self::RescheduleNotPending => StatusCode::CONFLICT,
            Self::RescheduleWindowClosed | Self::ProposedTimeInPast => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::CalendarApi(_) | Self::TokenRefresh(_) => StatusCode::BAD_GATEWAY,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
