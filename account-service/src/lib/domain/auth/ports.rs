use async_trait::async_trait;

use super::errors::AuthError;
use super::models::Principal;
use super::models::RegisterCommand;
use super::models::TokenPair;
use crate::domain::reset::models::ResetTicket;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;

/// Port for the credential and session lifecycle operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account.
    ///
    /// # Returns
    /// The created profile (never the password hash)
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `Io` - Hashing or store failure
    async fn register(&self, command: RegisterCommand) -> Result<UserProfile, AuthError>;

    /// Exchange email and password for an access/refresh token pair.
    ///
    /// # Errors
    /// * `Validation` - Email or password is empty
    /// * `Authentication` - Unknown email or wrong password, indistinguishably
    /// * `Config` - Tokens could not be signed
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Rotate a refresh token: the presented one is revoked and a new pair
    /// is issued. Each refresh token works once.
    ///
    /// # Errors
    /// * `Authentication` - Malformed, wrong kind, expired or revoked token
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Revoke an access or refresh token until its natural expiry.
    ///
    /// Idempotent. Tokens that cannot be decoded or are already expired are
    /// ignored.
    ///
    /// # Errors
    /// * `Io` - Registry failure
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Issue a reset token and hand it to the notification sink.
    ///
    /// # Errors
    /// * `Validation` - Email is empty or malformed
    /// * `NotFound` - No account has this email
    /// * `Io` - Store or notification failure
    async fn forgot_password(&self, email: &str) -> Result<ResetTicket, AuthError>;

    /// Set a new password with a reset token. The token is consumed only
    /// after the new hash is stored.
    ///
    /// # Errors
    /// * `Validation` - Token empty or new password too short
    /// * `Authentication` - Invalid, expired or already used token
    /// * `Io` - Store or registry failure
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;

    /// Gate for protected requests: accept an unexpired, unrevoked access
    /// token.
    ///
    /// # Errors
    /// * `Authentication` - Malformed, wrong kind, expired or revoked token
    /// * `Io` - Registry failure
    async fn authorize(&self, access_token: &str) -> Result<Principal, AuthError>;

    /// Public profile of a user.
    ///
    /// # Errors
    /// * `NotFound` - No such user
    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, AuthError>;
}
