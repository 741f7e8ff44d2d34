use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use auth::TokenCodec;
use chrono::Duration;

use super::errors::ResetTokenError;
use super::models::ResetClaims;
use super::models::ResetTicket;
use super::models::PASSWORD_RESET_PURPOSE;
use crate::domain::revocation::ports::RevocationRegistry;
use crate::domain::user::ports::UserRepository;

/// Issues and validates single-use, short-lived password-reset tokens.
///
/// A used token is recorded in the revocation registry under its token id
/// until its original expiry. Redemption goes through [`Redemption`], which
/// keeps a second concurrent attempt with the same token out while the
/// first one is updating the password.
pub struct ResetTokenManager<UR, RR>
where
    UR: UserRepository,
    RR: RevocationRegistry,
{
    users: Arc<UR>,
    registry: Arc<RR>,
    codec: Arc<TokenCodec>,
    ttl: Duration,
    in_flight: Mutex<HashSet<String>>,
}

impl<UR, RR> ResetTokenManager<UR, RR>
where
    UR: UserRepository,
    RR: RevocationRegistry,
{
    pub fn new(users: Arc<UR>, registry: Arc<RR>, codec: Arc<TokenCodec>, ttl: Duration) -> Self {
        Self {
            users,
            registry,
            codec,
            ttl,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Issue a reset token for the account registered under `email`.
    ///
    /// # Errors
    /// * `NotFound` - No account has this email
    /// * `Store` - Credential store lookup failed
    /// * `Signing` - Token could not be signed
    pub async fn issue(&self, email: &str) -> Result<ResetTicket, ResetTokenError> {
        if self.users.find_by_email(email).await?.is_none() {
            return Err(ResetTokenError::NotFound);
        }

        let claims = ResetClaims::new(email, self.codec.now(), self.ttl);
        let token = self.codec.sign(&claims)?;

        Ok(ResetTicket {
            email: claims.email.clone(),
            expires_at: claims.expires_at_utc(),
            token,
        })
    }

    /// Check a reset token and return its claims.
    ///
    /// # Errors
    /// * `Malformed` - Not a reset token
    /// * `InvalidSignature` - Signature or algorithm rejected
    /// * `Expired` - Past its expiry
    /// * `AlreadyUsed` - Already consumed by a successful reset
    /// * `Registry` - Revocation lookup failed
    pub async fn validate(&self, token: &str) -> Result<ResetClaims, ResetTokenError> {
        let claims = self.decode(token)?;

        if self.registry.is_revoked(&claims.jti).await? {
            return Err(ResetTokenError::AlreadyUsed);
        }

        Ok(claims)
    }

    /// Start redeeming a reset token.
    ///
    /// Same checks as [`Self::validate`], and additionally fails with
    /// `AlreadyUsed` while another redemption of the same token is in
    /// progress. Dropping the returned [`Redemption`] without consuming it
    /// makes the token redeemable again.
    pub async fn redeem(&self, token: &str) -> Result<Redemption<'_, UR, RR>, ResetTokenError> {
        let claims = self.decode(token)?;

        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(claims.jti.clone());
        if !inserted {
            return Err(ResetTokenError::AlreadyUsed);
        }

        // From here on the guard releases the slot on every exit path.
        let redemption = Redemption {
            manager: self,
            claims,
        };

        if self.registry.is_revoked(&redemption.claims.jti).await? {
            return Err(ResetTokenError::AlreadyUsed);
        }

        Ok(redemption)
    }

    /// Mark a reset token as used until its original expiry.
    ///
    /// # Errors
    /// * `AlreadyUsed` - Someone else consumed it first
    /// * `Registry` - Revocation insert failed
    pub async fn consume(&self, claims: &ResetClaims) -> Result<(), ResetTokenError> {
        if !self
            .registry
            .revoke(&claims.jti, claims.expires_at_utc())
            .await?
        {
            return Err(ResetTokenError::AlreadyUsed);
        }
        Ok(())
    }

    fn decode(&self, token: &str) -> Result<ResetClaims, ResetTokenError> {
        let claims: ResetClaims = self.codec.verify(token)?;

        if claims.purpose != PASSWORD_RESET_PURPOSE {
            return Err(ResetTokenError::Malformed(format!(
                "unexpected purpose {}",
                claims.purpose
            )));
        }

        Ok(claims)
    }

    fn release(&self, token_id: &str) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token_id);
    }
}

/// An in-progress use of a reset token.
///
/// Holds the token's in-flight slot until dropped.
pub struct Redemption<'a, UR, RR>
where
    UR: UserRepository,
    RR: RevocationRegistry,
{
    manager: &'a ResetTokenManager<UR, RR>,
    claims: ResetClaims,
}

impl<UR, RR> Redemption<'_, UR, RR>
where
    UR: UserRepository,
    RR: RevocationRegistry,
{
    /// Email the token was issued for.
    pub fn email(&self) -> &str {
        &self.claims.email
    }

    /// Consume the token. Call only after the password update succeeded.
    pub async fn consume(self) -> Result<(), ResetTokenError> {
        self.manager.consume(&self.claims).await
    }
}

impl<UR, RR> Drop for Redemption<'_, UR, RR>
where
    UR: UserRepository,
    RR: RevocationRegistry,
{
    fn drop(&mut self) {
        self.manager.release(&self.claims.jti);
    }
}
