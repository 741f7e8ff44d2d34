use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use auth::Clock;
use tokio::sync::RwLock;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::RepositoryError;

/// Credential store kept in process memory, keyed by email.
///
/// Used for development and tests; contents are lost on restart.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryUserRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;

        if users.contains_key(user.email.as_str()) {
            return Err(RepositoryError::DuplicateEmail(user.email.to_string()));
        }

        let user = User {
            id: UserId::new(),
            name: user.name,
            email: user.email,
            age: user.age,
            phone: user.phone,
            password_hash: user.password_hash,
            created_at: self.clock.now(),
        };
        users.insert(user.email.as_str().to_string(), user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.id == *id)
            .cloned())
    }

    async fn update_password(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(email)
            .ok_or_else(|| RepositoryError::NotFound(email.to_string()))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}
