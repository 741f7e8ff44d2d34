use std::fmt::Display;

use thiserror::Error;

use crate::user::errors::AgeError;
use crate::user::errors::EmailError;
use crate::user::errors::NameError;
use crate::user::errors::PasswordPolicyError;
use crate::user::errors::PhoneError;

/// Bad caller input. Raised before any storage is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid name: {0}")]
    Name(#[from] NameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),

    #[error("Invalid age: {0}")]
    Age(#[from] AgeError),

    #[error("Invalid phone number: {0}")]
    Phone(#[from] PhoneError),
}

/// Why a credential or token was rejected. Logged and asserted on, never
/// shown to the caller.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("unknown email or wrong password")]
    InvalidCredentials,

    #[error("token could not be decoded")]
    Malformed,

    #[error("token signature or algorithm rejected")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token is of the wrong kind")]
    WrongKind,

    #[error("token revoked")]
    Revoked,

    #[error("token already used")]
    AlreadyUsed,

    #[error("token subject no longer exists")]
    UnknownSubject,
}

impl From<auth::JwtError> for AuthFailure {
    fn from(err: auth::JwtError) -> Self {
        match err {
            auth::JwtError::InvalidSignature(_) => AuthFailure::InvalidSignature,
            auth::JwtError::Expired => AuthFailure::Expired,
            auth::JwtError::Malformed(_)
            | auth::JwtError::EncodingFailed(_)
            | auth::JwtError::MissingSecret => AuthFailure::Malformed,
        }
    }
}

/// Error taxonomy of the auth service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Uniform message regardless of the reason.
    #[error("Authentication failed")]
    Authentication(AuthFailure),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Not found")]
    NotFound,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to {context}: {message}")]
    Io {
        context: &'static str,
        message: String,
    },
}

impl AuthError {
    /// Wrap an infrastructure failure with the step it happened in and log
    /// it with full detail.
    pub fn io(context: &'static str, err: impl Display) -> Self {
        let message = err.to_string();
        tracing::error!(context, error = %message, "Infrastructure failure");
        AuthError::Io { context, message }
    }

    /// Internal reason of an authentication failure, if this is one.
    pub fn failure(&self) -> Option<AuthFailure> {
        match self {
            AuthError::Authentication(failure) => Some(*failure),
            _ => None,
        }
    }
}

impl From<AuthFailure> for AuthError {
    fn from(failure: AuthFailure) -> Self {
        AuthError::Authentication(failure)
    }
}
