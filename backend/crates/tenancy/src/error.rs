//! Tenancy Error Types
//!
//! This module provides tenancy-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Tenancy-specific result type alias
pub type TenancyResult<T> = Result<T, TenancyError>;

/// Tenancy-specific error variants
#[derive(Debug, Error)]
pub enum TenancyError {
    /// Malformed email/PIN/payload - caller-fixable
    #[error("{0}")]
    Validation(String),

    /// Organization not found
    #[error("Organization not found")]
    OrganizationNotFound,

    /// Branch not found
    #[error("Branch not found")]
    BranchNotFound,

    /// Account not found
    #[error("Account not found")]
    AccountNotFound,

    /// Invite token not found
    #[error("Invite not found")]
    InviteNotFound,

    /// Invite token was already consumed
    #[error("Invite has already been used")]
    InviteAlreadyUsed,

    /// Invite token is past its expiry
    #[error("Invite has expired")]
    InviteExpired,

    /// Invalid credentials (wrong PIN/password, unknown identifier)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account is disabled
    #[error("Account is disabled")]
    AccountDisabled,

    /// Actor is not the organization owner
    #[error("Only the organization owner may perform this action")]
    NotOwner,

    /// Actor is scoped to a different organization or branch
    #[error("Actor is not scoped to this resource")]
    ScopeMismatch,

    /// Session not found, malformed, or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Duplicate username/slug under race
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Auth-provider (directory) failure
    #[error("Directory provider error: {0}")]
    Provider(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TenancyError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            TenancyError::Validation(_) => StatusCode::BAD_REQUEST,
            TenancyError::OrganizationNotFound
            | TenancyError::BranchNotFound
            | TenancyError::AccountNotFound
            | TenancyError::InviteNotFound => StatusCode::NOT_FOUND,
            TenancyError::InviteAlreadyUsed => StatusCode::BAD_REQUEST,
            TenancyError::InviteExpired => StatusCode::GONE,
            TenancyError::InvalidCredentials | TenancyError::SessionInvalid => {
                StatusCode::UNAUTHORIZED
            }
            TenancyError::AccountDisabled
            | TenancyError::NotOwner
            | TenancyError::ScopeMismatch => StatusCode::FORBIDDEN,
            TenancyError::Conflict(_) => StatusCode::CONFLICT,
            TenancyError::Database(_)
            | TenancyError::Provider(_)
            | TenancyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TenancyError::Validation(_) | TenancyError::InviteAlreadyUsed => ErrorKind::BadRequest,
            TenancyError::OrganizationNotFound
            | TenancyError::BranchNotFound
            | TenancyError::AccountNotFound
            | TenancyError::InviteNotFound => ErrorKind::NotFound,
            TenancyError::InviteExpired => ErrorKind::Gone,
            TenancyError::InvalidCredentials | TenancyError::SessionInvalid => {
                ErrorKind::Unauthorized
            }
            TenancyError::AccountDisabled
            | TenancyError::NotOwner
            | TenancyError::ScopeMismatch => ErrorKind::Forbidden,
            TenancyError::Conflict(_) => ErrorKind::Conflict,
            TenancyError::Database(_)
            | TenancyError::Provider(_)
            | TenancyError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// 5xx detail is sanitized here; the full error is logged server-side.
    pub fn to_app_error(&self) -> AppError {
        if self.kind().is_server_error() {
            AppError::new(self.kind(), "Something went wrong")
        } else {
            AppError::new(self.kind(), self.to_string())
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            TenancyError::Database(e) => {
                tracing::error!(error = %e, "Tenancy database error");
            }
            TenancyError::Provider(msg) => {
                tracing::error!(message = %msg, "Directory provider error");
            }
            TenancyError::Internal(msg) => {
                tracing::error!(message = %msg, "Tenancy internal error");
            }
            TenancyError::InvalidCredentials => {
                tracing::warn!("Invalid sign-in attempt");
            }
            TenancyError::NotOwner | TenancyError::ScopeMismatch => {
                tracing::warn!(error = %self, "Authorization failure");
            }
            _ => {
                tracing::debug!(error = %self, "Tenancy error");
            }
        }
    }
}

impl IntoResponse for TenancyError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for TenancyError {
    fn from(err: AppError) -> Self {
        if err.kind() == ErrorKind::BadRequest {
            TenancyError::Validation(err.message().to_string())
        } else {
            TenancyError::Internal(err.to_string())
        }
    }
}

impl From<platform::pin::PinPolicyError> for TenancyError {
    fn from(err: platform::pin::PinPolicyError) -> Self {
        TenancyError::Validation(err.to_string())
    }
}

impl From<platform::pin::PinHashError> for TenancyError {
    fn from(err: platform::pin::PinHashError) -> Self {
        TenancyError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            TenancyError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TenancyError::InviteNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TenancyError::InviteAlreadyUsed.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(TenancyError::InviteExpired.status_code(), StatusCode::GONE);
        assert_eq!(
            TenancyError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            TenancyError::AccountDisabled.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(TenancyError::NotOwner.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            TenancyError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            TenancyError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_sanitized() {
        let err = TenancyError::Internal("connection string with secrets".into());
        let app_err = err.to_app_error();
        assert!(!app_err.message().contains("secrets"));

        let err = TenancyError::InviteExpired;
        let app_err = err.to_app_error();
        assert_eq!(app_err.message(), "Invite has expired");
    }
}
