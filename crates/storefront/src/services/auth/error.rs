//! Authentication service errors.

use thiserror::Error;

use harbor_thread_core::EmailError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email address is invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password doesn't meet requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// A user with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Email/password combination is wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing or verification failed internally.
    #[error("password hash error: {0}")]
    PasswordHash(String),

    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
