use std::fmt;

use auth::ExpiringClaims;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Value of the `purpose` claim of every reset token.
pub const PASSWORD_RESET_PURPOSE: &str = "password_reset";

/// Claims of a password-reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetClaims {
    /// Email of the account the token may reset
    pub email: String,

    /// Always [`PASSWORD_RESET_PURPOSE`]
    pub purpose: String,

    /// Unique token id, revoked once the token has been used
    pub jti: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl ResetClaims {
    pub fn new(email: impl Into<String>, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            email: email.into(),
            purpose: PASSWORD_RESET_PURPOSE.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    pub fn expires_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl ExpiringClaims for ResetClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// A signed reset token together with whom it is for.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetTicket {
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for ResetTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetTicket")
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
