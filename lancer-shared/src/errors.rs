use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Authentication, lockout and email verification errors
/// - E2xxx: Profile, resume and administration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    ServiceUnavailable,
    BadRequest,
    PayloadTooLarge,

    // Auth (E1xxx)
    InvalidCredentials,
    AccountLocked,
    AccountDisabled,
    EmailAlreadyExists,
    UsernameTaken,
    TokenExpired,
    TokenInvalid,
    RefreshTokenRevoked,
    OAuthError,
    PasswordTooWeak,
    PasswordMismatch,
    VerificationCodeFormat,
    AlreadyVerified,
    VerificationCodeMissing,
    VerificationCodeExpired,
    VerificationCodeInvalid,
    NotificationFailed,
    EmailRateLimited,

    // Profile / admin (E2xxx)
    UserNotFound,
    InvalidUserType,
    PhotoUploadFailed,
    RecordNotFound,
    SocialLinkExists,
    GroupNotFound,
    InvalidRating,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::RateLimited => "E0006",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",
            Self::PayloadTooLarge => "E0009",

            // Auth
            Self::InvalidCredentials => "E1001",
            Self::AccountLocked => "E1002",
            Self::AccountDisabled => "E1003",
            Self::EmailAlreadyExists => "E1004",
            Self::UsernameTaken => "E1005",
            Self::TokenExpired => "E1006",
            Self::TokenInvalid => "E1007",
            Self::RefreshTokenRevoked => "E1008",
            Self::OAuthError => "E1009",
            Self::PasswordTooWeak => "E1010",
            Self::PasswordMismatch => "E1011",
            Self::VerificationCodeFormat => "E1012",
            Self::AlreadyVerified => "E1013",
            Self::VerificationCodeMissing => "E1014",
            Self::VerificationCodeExpired => "E1015",
            Self::VerificationCodeInvalid => "E1016",
            Self::NotificationFailed => "E1017",
            Self::EmailRateLimited => "E1018",

            // Profile / admin
            Self::UserNotFound => "E2001",
            Self::InvalidUserType => "E2002",
            Self::PhotoUploadFailed => "E2003",
            Self::RecordNotFound => "E2004",
            Self::SocialLinkExists => "E2005",
            Self::GroupNotFound => "E2006",
            Self::InvalidRating => "E2007",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::PasswordTooWeak
            | Self::PasswordMismatch | Self::InvalidUserType | Self::InvalidRating
            | Self::GroupNotFound => StatusCode::BAD_REQUEST,
            Self::VerificationCodeFormat | Self::AlreadyVerified | Self::VerificationCodeMissing
            | Self::VerificationCodeExpired | Self::VerificationCodeInvalid => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound | Self::UserNotFound | Self::RecordNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials | Self::TokenExpired
            | Self::TokenInvalid | Self::RefreshTokenRevoked => StatusCode::UNAUTHORIZED,
            Self::AccountLocked => StatusCode::LOCKED,
            Self::Forbidden | Self::AccountDisabled => StatusCode::FORBIDDEN,
            Self::RateLimited | Self::EmailRateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::EmailAlreadyExists | Self::UsernameTaken | Self::SocialLinkExists => StatusCode::CONFLICT,
            Self::OAuthError | Self::PhotoUploadFailed => StatusCode::BAD_REQUEST,
            Self::NotificationFailed => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The error code of a known error, `None` for internal/database failures.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            AppError::Known { code, .. } => Some(*code),
            AppError::Validation(_) => Some(ErrorCode::ValidationError),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(errors.field_errors()).unwrap_or_default();
        Self::with_details(ErrorCode::ValidationError, "request validation failed", details)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_errors_map_to_distinct_statuses() {
        assert_eq!(ErrorCode::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::AccountLocked.status_code(), StatusCode::LOCKED);
        assert_eq!(ErrorCode::AccountDisabled.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotificationFailed.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn known_error_exposes_code() {
        let err = AppError::new(ErrorCode::VerificationCodeExpired, "expired");
        assert_eq!(err.code(), Some(ErrorCode::VerificationCodeExpired));
        assert_eq!(err.to_string(), "expired");

        let err = AppError::internal("boom");
        assert_eq!(err.code(), Some(ErrorCode::InternalError));

        let err = AppError::Database(diesel::result::Error::NotFound);
        assert_eq!(err.code(), None);
    }
}
