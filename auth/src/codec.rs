use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::Clock;
use crate::jwt::Claims;
use crate::jwt::ExpiringClaims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::TokenKind;

/// A freshly signed session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Token codec: issues and parses access/refresh tokens.
///
/// Wraps a [`JwtHandler`] with a clock so that issued-at, expires-at and
/// the expiry check all come from the same time source.
pub struct TokenCodec {
    jwt_handler: JwtHandler,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(jwt_handler: JwtHandler, clock: Arc<dyn Clock>) -> Self {
        Self { jwt_handler, clock }
    }

    /// Current time according to the codec's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Issue a token for `subject` that lives for `ttl`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn issue(
        &self,
        subject: impl ToString,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<IssuedToken, JwtError> {
        let claims = Claims::issue(subject, kind, self.clock.now(), ttl);
        let token = self.jwt_handler.encode(&claims)?;

        tracing::debug!(
            subject = %claims.sub,
            kind = %kind,
            token_id = %claims.jti,
            "Token issued"
        );

        Ok(IssuedToken {
            expires_at: claims.expires_at_utc(),
            token_id: claims.jti,
            token,
        })
    }

    /// Verify signature and expiry and return the claims.
    ///
    /// # Errors
    /// * `Malformed` - Token cannot be decoded
    /// * `InvalidSignature` - Wrong algorithm or signature mismatch
    /// * `Expired` - Token is past its expiry
    pub fn parse(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify(token)
    }

    /// Verify the signature but accept an expired token.
    pub fn parse_ignoring_expiry(&self, token: &str) -> Result<Claims, JwtError> {
        self.jwt_handler.decode_ignoring_expiry(token)
    }

    /// Sign arbitrary claims with the shared secret.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        self.jwt_handler.encode(claims)
    }

    /// Verify arbitrary claims against the shared secret and the clock.
    pub fn verify<T>(&self, token: &str) -> Result<T, JwtError>
    where
        T: DeserializeOwned + ExpiringClaims,
    {
        self.jwt_handler.decode(token, self.clock.now().timestamp())
    }
}
