//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::AppError` system.

use kernel::{AppError, ErrorKind};
use platform::error::ApiError;
use platform::storage::StorageError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The backend answered without the expected payload
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The OAuth provider reported an error in the callback
    #[error("OAuth sign-in failed: {0}")]
    OAuthDenied(String),

    /// The OAuth callback carried no tokens
    #[error("OAuth callback is missing tokens")]
    MissingCallbackTokens,

    /// The OAuth callback target could not be parsed
    #[error("Invalid callback URL: {0}")]
    InvalidCallbackUrl(String),

    /// Persisted session could not be read or written
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    /// Persisted session is not valid JSON
    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials | AuthError::MissingCallbackTokens => {
                ErrorKind::Unauthorized
            }
            AuthError::OAuthDenied(_) => ErrorKind::Forbidden,
            AuthError::Rejected(_) | AuthError::InvalidCallbackUrl(_) => ErrorKind::BadRequest,
            AuthError::Storage(_) => ErrorKind::InternalServerError,
            AuthError::Serialization(_) => ErrorKind::Decode,
            AuthError::Api(err) => err.kind(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Api(err) => err.to_app_error(),
            AuthError::InvalidCredentials => AppError::new(self.kind(), self.to_string())
                .with_action("Check your email and password"),
            AuthError::OAuthDenied(_) | AuthError::MissingCallbackTokens => {
                AppError::new(self.kind(), self.to_string()).with_action("Please sign in again")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AuthError::Storage(e) => {
                tracing::warn!(error = %e, "Session storage failure");
            }
            AuthError::Serialization(e) => {
                tracing::warn!(error = %e, "Persisted session is corrupt");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::OAuthDenied(reason) => {
                tracing::warn!(reason = %reason, "OAuth provider denied sign-in");
            }
            AuthError::Api(err) => err.log(),
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.to_app_error()
    }
}
