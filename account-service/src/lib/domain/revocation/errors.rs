use thiserror::Error;

/// Revocation registry failures. Only storage-backed registries produce them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RevocationError {
    #[error("Revocation storage error: {0}")]
    Storage(String),
}
