//! RBAC Error Types
//!
//! Every failure the core can report. Variants map onto the unified
//! `kernel::error::AppError` at the HTTP boundary.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// RBAC result type alias
pub type RbacResult<T> = Result<T, RbacError>;

/// RBAC error variants
#[derive(Debug, Error)]
pub enum RbacError {
    /// Email failed format validation
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password rejected by the registration policy
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    /// Email already registered
    #[error("Email already registered")]
    DuplicateEmail,

    /// Unknown email or wrong password. Both cases share this variant and
    /// message so the response never reveals which one happened.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Correct credentials, deactivated account
    #[error("Inactive account")]
    InactiveAccount,

    /// Token failed signature, structure or expiry checks, or has no usable
    /// subject
    #[error("Token validation failed")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Role not found")]
    RoleNotFound,

    /// No assigned level reaches the required one
    #[error("Insufficient role level")]
    InsufficientPermission { required: i32 },

    /// Configuration rejected at startup
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RbacError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RbacError::InvalidEmail(_) => ErrorKind::BadRequest,
            RbacError::PasswordValidation(_) => ErrorKind::UnprocessableEntity,
            RbacError::DuplicateEmail => ErrorKind::Conflict,
            RbacError::InvalidCredentials | RbacError::InvalidToken => ErrorKind::Unauthorized,
            RbacError::InactiveAccount | RbacError::InsufficientPermission { .. } => {
                ErrorKind::Forbidden
            }
            RbacError::UserNotFound | RbacError::RoleNotFound => ErrorKind::NotFound,
            RbacError::Config(_) | RbacError::Database(_) | RbacError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            RbacError::InvalidEmail(_) => "INVALID_EMAIL",
            RbacError::PasswordValidation(_) => "PASSWORD_VALIDATION",
            RbacError::DuplicateEmail => "DUPLICATE_EMAIL",
            RbacError::InvalidCredentials => "INVALID_CREDENTIALS",
            RbacError::InactiveAccount => "INACTIVE_ACCOUNT",
            RbacError::InvalidToken => "INVALID_TOKEN",
            RbacError::UserNotFound => "USER_NOT_FOUND",
            RbacError::RoleNotFound => "ROLE_NOT_FOUND",
            RbacError::InsufficientPermission { .. } => "INSUFFICIENT_PERMISSION",
            RbacError::Config(_) => "CONFIG",
            RbacError::Database(_) => "STORE",
            RbacError::Internal(_) => "INTERNAL",
        }
    }

    /// Convert to AppError. Server-side details stay out of the message.
    pub fn to_app_error(&self) -> AppError {
        let message = if self.kind().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let err = AppError::new(self.kind(), message).with_code(self.code());
        match self.action() {
            Some(action) => err.with_action(action),
            None => err,
        }
    }

    /// What the client can do about it, where there is something to do
    fn action(&self) -> Option<&'static str> {
        match self {
            RbacError::InvalidToken => Some("Sign in again to obtain a new access token"),
            RbacError::InactiveAccount => Some("Contact an administrator to reactivate the account"),
            RbacError::DuplicateEmail => Some("Sign in or register with a different email"),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            RbacError::Database(e) => {
                tracing::error!(error = %e, "RBAC database error");
            }
            RbacError::Internal(msg) | RbacError::Config(msg) => {
                tracing::error!(message = %msg, "RBAC internal error");
            }
            RbacError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            RbacError::InvalidToken => {
                tracing::warn!("Rejected access token");
            }
            RbacError::InsufficientPermission { required } => {
                tracing::debug!(required_level = required, "Permission denied");
            }
            _ => {
                tracing::debug!(error = %self, "RBAC error");
            }
        }
    }
}

impl IntoResponse for RbacError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<platform::password::PasswordPolicyError> for RbacError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        RbacError::PasswordValidation(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for RbacError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        RbacError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for RbacError {
    fn from(err: tokio::task::JoinError) -> Self {
        RbacError::Internal(format!("Blocking task failed: {err}"))
    }
}
