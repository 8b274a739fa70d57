//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_object::account_type::AccountType;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Account not found
    #[error("Account with this email does not exist")]
    AccountNotFound,

    /// Email already registered
    #[error("An account with this email already exists")]
    EmailTaken,

    /// Phone number already registered
    #[error("An account with this phone number already exists")]
    PhoneTaken,

    /// Invalid credentials (wrong password)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account has not completed OTP verification
    #[error("Your account is not verified. Please verify your account first")]
    AccountNotVerified,

    /// Account is inactive
    #[error("Your account is inactive. Please contact support")]
    AccountInactive,

    /// Account is blocked
    #[error("Your account has been blocked. Please contact support")]
    AccountBlocked,

    /// Account is suspended
    #[error("Your account has been suspended. Please contact support")]
    AccountSuspended,

    /// OTP does not match
    #[error("Invalid OTP")]
    OtpMismatch,

    /// OTP has expired
    #[error("OTP has expired. Please request a new one")]
    OtpExpired,

    /// Token signature/exp check failed on expiry
    #[error("Token has expired")]
    TokenExpired,

    /// Token is malformed or has a bad signature
    #[error("Invalid token")]
    TokenInvalid,

    /// Supplied refresh token is no longer the active one
    #[error("Refresh token is no longer valid. Please sign in again")]
    TokenStale,

    /// Device registry is at capacity for this account tier
    #[error("Device limit reached for {tier} accounts ({limit} devices)")]
    DeviceLimitExceeded { tier: AccountType, limit: usize },

    /// Login record missing on signout
    #[error("No login record found for this account")]
    LoginRecordNotFound,

    /// Request field failed validation
    #[error("{0}")]
    Validation(String),

    /// Password validation error
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AccountNotFound => StatusCode::NOT_FOUND,
            AuthError::EmailTaken | AuthError::PhoneTaken => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::OtpMismatch | AuthError::OtpExpired => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::AccountNotVerified
            | AuthError::AccountInactive
            | AuthError::AccountBlocked
            | AuthError::AccountSuspended => StatusCode::FORBIDDEN,
            AuthError::TokenExpired | AuthError::TokenInvalid => StatusCode::UNAUTHORIZED,
            AuthError::TokenStale | AuthError::DeviceLimitExceeded { .. } => StatusCode::FORBIDDEN,
            AuthError::LoginRecordNotFound => StatusCode::NOT_FOUND,
            AuthError::Validation(_) | AuthError::PasswordValidation(_) => StatusCode::BAD_REQUEST,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::AccountNotFound | AuthError::LoginRecordNotFound => ErrorKind::NotFound,
            AuthError::EmailTaken | AuthError::PhoneTaken => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::OtpMismatch
            | AuthError::OtpExpired
            | AuthError::TokenExpired
            | AuthError::TokenInvalid => ErrorKind::Unauthorized,
            AuthError::AccountNotVerified
            | AuthError::AccountInactive
            | AuthError::AccountBlocked
            | AuthError::AccountSuspended
            | AuthError::TokenStale
            | AuthError::DeviceLimitExceeded { .. } => ErrorKind::Forbidden,
            AuthError::Validation(_) | AuthError::PasswordValidation(_) => ErrorKind::BadRequest,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::TokenStale => {
                tracing::warn!("Stale refresh token presented");
            }
            AuthError::DeviceLimitExceeded { tier, limit } => {
                tracing::warn!(%tier, limit, "Device limit reached");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<crate::domain::value_object::otp::OtpError> for AuthError {
    fn from(err: crate::domain::value_object::otp::OtpError) -> Self {
        use crate::domain::value_object::otp::OtpError;
        match err {
            OtpError::Mismatch => AuthError::OtpMismatch,
            OtpError::Expired => AuthError::OtpExpired,
        }
    }
}

impl From<crate::token::TokenError> for AuthError {
    fn from(err: crate::token::TokenError) -> Self {
        use crate::token::TokenError;
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::TokenInvalid,
        }
    }
}

impl From<crate::domain::entity::account::DeviceLimitExceeded> for AuthError {
    fn from(err: crate::domain::entity::account::DeviceLimitExceeded) -> Self {
        AuthError::DeviceLimitExceeded {
            tier: err.tier,
            limit: err.limit,
        }
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::PasswordValidation(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

// ============================================================
// Tests
// ============================================================
