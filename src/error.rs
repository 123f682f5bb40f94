/// Unified error types for the Lifetracker backend
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Missing, unknown or malformed bearer token, or bad login credentials
    #[error("{0}")]
    Unauthenticated(String),

    /// Session exists but its absolute expiry has passed
    #[error("Invalid or expired token")]
    Expired,

    /// Account exists but has not completed email verification
    #[error("{0}")]
    Inactive(String),

    /// Malformed input shape or policy violation
    #[error("{0}")]
    Validation(String),

    /// Legacy category reference could not be parsed
    #[error("Invalid type: {0}")]
    InvalidType(String),

    /// Verification code did not match
    #[error("Invalid verification code")]
    InvalidCode,

    /// Mutation attempted on a system default category
    #[error("{0}")]
    Immutable(String),

    /// Not found errors (also used for records owned by somebody else)
    #[error("{0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate name or email)
    #[error("{0}")]
    Conflict(String),

    /// Outbound email could not be delivered
    #[error("Mail delivery failed: {0}")]
    Mail(String),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

impl TrackerError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::Unauthenticated(_) | TrackerError::Expired | TrackerError::Inactive(_) => {
                StatusCode::UNAUTHORIZED
            }
            TrackerError::Validation(_)
            | TrackerError::InvalidType(_)
            | TrackerError::InvalidCode
            | TrackerError::Immutable(_) => StatusCode::BAD_REQUEST,
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::Conflict(_) => StatusCode::CONFLICT,
            TrackerError::Mail(_) => StatusCode::BAD_GATEWAY,
            TrackerError::Database(_)
            | TrackerError::Migration(_)
            | TrackerError::PasswordHash(_)
            | TrackerError::Io(_)
            | TrackerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            TrackerError::Unauthenticated(_) => "Unauthenticated",
            TrackerError::Expired => "SessionExpired",
            TrackerError::Inactive(_) => "AccountInactive",
            TrackerError::Validation(_) => "InvalidRequest",
            TrackerError::InvalidType(_) => "InvalidType",
            TrackerError::InvalidCode => "InvalidCode",
            TrackerError::Immutable(_) => "ImmutableResource",
            TrackerError::NotFound(_) => "NotFound",
            TrackerError::Conflict(_) => "Conflict",
            TrackerError::Mail(_) => "MailDeliveryFailed",
            _ => "InternalServerError",
        }
    }
}

/// Convert TrackerError to HTTP response
impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = match &self {
            TrackerError::Database(_)
            | TrackerError::Migration(_)
            | TrackerError::PasswordHash(_)
            | TrackerError::Io(_)
            | TrackerError::Internal(_) => {
                tracing::error!(error = %self, "Request failed with internal error");
                "Internal server error".to_string() // Don't leak details
            }
            TrackerError::Mail(_) => {
                tracing::warn!(error = %self, "Verification mail could not be delivered");
                "Verification email could not be sent, please try again".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            detail,
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<JsonRejection> for TrackerError {
    fn from(rejection: JsonRejection) -> Self {
        TrackerError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for TrackerError {
    fn from(rejection: PathRejection) -> Self {
        TrackerError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for TrackerError {
    fn from(rejection: QueryRejection) -> Self {
        TrackerError::Validation(rejection.body_text())
    }
}

/// Result type alias for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;
