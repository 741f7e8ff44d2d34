use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use super::errors::RevocationError;

/// Tokens that must be rejected even though they are well-formed and
/// unexpired, keyed by token id.
///
/// An entry is active while `now <= expires_at`. Once past its expiry it is
/// logically absent, whether or not it has been physically removed yet.
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait RevocationRegistry: Send + Sync + 'static {
    /// Record `key` as revoked until `expires_at`.
    ///
    /// Idempotent. Revoking an already revoked key keeps the later of the
    /// two expiries.
    ///
    /// # Returns
    /// `true` if no active entry existed for `key` before this call, i.e.
    /// this caller is the one that revoked it
    ///
    /// # Errors
    /// * `Storage` - Backing store failed
    async fn revoke(&self, key: &str, expires_at: DateTime<Utc>) -> Result<bool, RevocationError>;

    /// Whether `key` has an active entry.
    ///
    /// An expired entry found here is purged and reported as not revoked.
    ///
    /// # Errors
    /// * `Storage` - Backing store failed
    async fn is_revoked(&self, key: &str) -> Result<bool, RevocationError>;

    /// Remove every expired entry.
    ///
    /// # Returns
    /// Number of entries removed
    async fn purge_expired(&self) -> Result<u64, RevocationError>;
}
