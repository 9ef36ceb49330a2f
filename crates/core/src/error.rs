//! Service error model.

use thiserror::Error;

/// Result type used by service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced at the gate/registrar boundary.
///
/// The `Display` text of every variant except `DataIntegrity` and `Internal` is
/// safe to return to a caller. Those two carry server-side detail that must be
/// logged and replaced with a generic message before leaving the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// No bearer token was presented.
    #[error("authentication required")]
    Unauthenticated,

    /// The token is malformed, expired, badly signed, or its subject is gone.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Authenticated, but the account kind is not allowed here.
    #[error("forbidden")]
    Forbidden,

    /// A unique key (username or email) is already taken.
    #[error("{0}")]
    Conflict(String),

    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The resource does not exist or is not owned by the caller.
    #[error("resource not found or not owned by caller")]
    NotFoundOrUnauthorized,

    /// A record that must exist (e.g. a profile extension) is missing.
    #[error("data integrity fault: {0}")]
    DataIntegrity(String),

    /// Unexpected store, codec or hashing failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::DataIntegrity(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for failures whose detail must stay server-side.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::DataIntegrity(_) | Self::Internal(_))
    }
}
