use async_trait::async_trait;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::RepositoryError;

/// Credential store: durable user records keyed by email and by id.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user; the store assigns its id and creation time.
    ///
    /// Atomic per record: on error nothing is persisted.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `Database` - Database operation failed
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Retrieve user by email address (exact, case-sensitive match).
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Replace the stored password hash of the user with this email.
    ///
    /// # Errors
    /// * `NotFound` - No user with this email
    /// * `Database` - Database operation failed
    async fn update_password(&self, email: &str, password_hash: &str)
        -> Result<(), RepositoryError>;
}
