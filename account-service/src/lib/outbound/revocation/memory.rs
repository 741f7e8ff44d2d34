use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use auth::Clock;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::revocation::errors::RevocationError;
use crate::domain::revocation::ports::RevocationRegistry;

/// Process-local revocation registry.
///
/// Map of token id -> expiry behind a single reader/writer lock. Reads
/// (the hot path of every protected request) share the lock; only inserts
/// and purges take it exclusively.
#[derive(Clone)]
pub struct InMemoryRevocationRegistry {
    entries: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRevocationRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl RevocationRegistry for InMemoryRevocationRegistry {
    async fn revoke(&self, key: &str, expires_at: DateTime<Utc>) -> Result<bool, RevocationError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        match entries.get_mut(key) {
            Some(existing) if now <= *existing => {
                if expires_at > *existing {
                    *existing = expires_at;
                }
                Ok(false)
            }
            _ => {
                entries.insert(key.to_string(), expires_at);
                Ok(true)
            }
        }
    }

    async fn is_revoked(&self, key: &str) -> Result<bool, RevocationError> {
        let now = self.clock.now();

        match self.entries.read().await.get(key) {
            None => return Ok(false),
            Some(expires_at) if now <= *expires_at => return Ok(true),
            Some(_) => {}
        }

        // Expired: re-check under the write lock, a concurrent revoke may
        // have renewed the entry in between.
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(expires_at) if now <= *expires_at => Ok(true),
            Some(_) => {
                entries.remove(key);
                tracing::debug!(token_id = %key, "Purged expired revocation entry");
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired(&self) -> Result<u64, RevocationError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        let before = entries.len();
        entries.retain(|_, expires_at| now <= *expires_at);

        Ok((before - entries.len()) as u64)
    }
}
