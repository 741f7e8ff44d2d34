use thiserror::Error;

use crate::domain::revocation::errors::RevocationError;
use crate::user::errors::RepositoryError;

/// Reset-token manager failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResetTokenError {
    #[error("No account for this email")]
    NotFound,

    #[error("Malformed reset token: {0}")]
    Malformed(String),

    #[error("Invalid reset token signature: {0}")]
    InvalidSignature(String),

    #[error("Reset token expired")]
    Expired,

    #[error("Reset token already used")]
    AlreadyUsed,

    #[error("Failed to sign reset token: {0}")]
    Signing(String),

    #[error("Credential store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("Revocation registry error: {0}")]
    Registry(#[from] RevocationError),
}

impl From<auth::JwtError> for ResetTokenError {
    fn from(err: auth::JwtError) -> Self {
        match err {
            auth::JwtError::Malformed(msg) => ResetTokenError::Malformed(msg),
            auth::JwtError::InvalidSignature(msg) => ResetTokenError::InvalidSignature(msg),
            auth::JwtError::Expired => ResetTokenError::Expired,
            auth::JwtError::EncodingFailed(msg) => ResetTokenError::Signing(msg),
            auth::JwtError::MissingSecret => {
                ResetTokenError::Signing("signing secret is missing".to_string())
            }
        }
    }
}

/// Notification sink failures. Reported to the caller, never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Failed to deliver notification: {0}")]
    DeliveryFailed(String),
}
