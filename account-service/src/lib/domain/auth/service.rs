use std::sync::Arc;

use async_trait::async_trait;
use auth::Claims;
use auth::PasswordHasher;
use auth::TokenCodec;
use auth::TokenKind;

use super::errors::AuthError;
use super::errors::AuthFailure;
use super::errors::ValidationError;
use super::models::AuthSettings;
use super::models::Principal;
use super::models::RegisterCommand;
use super::models::TokenPair;
use super::ports::AuthServicePort;
use crate::domain::reset::errors::ResetTokenError;
use crate::domain::reset::models::ResetTicket;
use crate::domain::reset::ports::NotificationSink;
use crate::domain::reset::service::ResetTokenManager;
use crate::domain::revocation::ports::RevocationRegistry;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::Password;
use crate::domain::user::models::UserId;
use crate::domain::user::models::User;
use crate::domain::user::models::UserProfile;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::RepositoryError;

/// Domain service implementation for the credential and session lifecycle.
///
/// Concrete implementation of AuthServicePort with dependency injection.
pub struct AuthService<UR, RR, NS>
where
    UR: UserRepository,
    RR: RevocationRegistry,
    NS: NotificationSink,
{
    users: Arc<UR>,
    registry: Arc<RR>,
    notifications: Arc<NS>,
    codec: Arc<TokenCodec>,
    reset_tokens: ResetTokenManager<UR, RR>,
    password_hasher: PasswordHasher,
    /// Verified against on logins for unknown emails so they cost as much
    /// as a wrong password.
    dummy_hash: Option<String>,
    settings: AuthSettings,
}

const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-accounts";

fn dummy_hash(password_hasher: &PasswordHasher) -> Option<String> {
    match password_hasher.hash(DUMMY_PASSWORD) {
        Ok(hash) => Some(hash),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to prepare dummy password hash");
            None
        }
    }
}

impl<UR, RR, NS> AuthService<UR, RR, NS>
where
    UR: UserRepository,
    RR: RevocationRegistry,
    NS: NotificationSink,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - Credential store
    /// * `registry` - Revocation registry shared by session and reset tokens
    /// * `notifications` - Delivery of reset tokens
    /// * `codec` - Token codec holding the signing secret and the clock
    /// * `settings` - Token lifetimes
    pub fn new(
        users: Arc<UR>,
        registry: Arc<RR>,
        notifications: Arc<NS>,
        codec: Arc<TokenCodec>,
        settings: AuthSettings,
    ) -> Self {
        let reset_tokens = ResetTokenManager::new(
            Arc::clone(&users),
            Arc::clone(&registry),
            Arc::clone(&codec),
            settings.reset_ttl,
        );

        let password_hasher = PasswordHasher::new();

        Self {
            users,
            registry,
            notifications,
            codec,
            reset_tokens,
            dummy_hash: dummy_hash(&password_hasher),
            password_hasher,
            settings,
        }
    }

    /// Replace the default password hasher.
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.dummy_hash = dummy_hash(&password_hasher);
        self.password_hasher = password_hasher;
        self
    }

    /// Check `password` against the user's hash, or against the dummy hash
    /// when there is no user, so both cases do the same work.
    fn verify_password(&self, user: Option<&User>, password: &str) -> Result<bool, AuthError> {
        match user {
            Some(user) => self
                .password_hasher
                .verify(password, &user.password_hash)
                .map_err(|e| AuthError::io("verify password", e)),
            None => {
                if let Some(dummy) = &self.dummy_hash {
                    let _ = self.password_hasher.verify(password, dummy);
                }
                Ok(false)
            }
        }
    }

    fn issue_pair(&self, user_id: &UserId) -> Result<TokenPair, AuthError> {
        let access = self
            .codec
            .issue(user_id, TokenKind::Access, self.settings.access_ttl)
            .map_err(|e| AuthError::Config(e.to_string()))?;
        let refresh = self
            .codec
            .issue(user_id, TokenKind::Refresh, self.settings.refresh_ttl)
            .map_err(|e| AuthError::Config(e.to_string()))?;

        Ok(TokenPair {
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token: refresh.token,
            refresh_expires_at: refresh.expires_at,
        })
    }

    /// Parse a session token, require its kind and check it is not revoked.
    async fn verify_session(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let claims = self.codec.parse(token).map_err(AuthFailure::from)?;

        if claims.kind != kind {
            return Err(AuthFailure::WrongKind.into());
        }

        if self
            .registry
            .is_revoked(&claims.jti)
            .await
            .map_err(|e| AuthError::io("check token revocation", e))?
        {
            return Err(AuthFailure::Revoked.into());
        }

        Ok(claims)
    }
}

fn subject(claims: &Claims) -> Result<UserId, AuthError> {
    UserId::from_string(&claims.sub).map_err(|_| AuthFailure::Malformed.into())
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value)
}

fn log_rejection<T>(operation: &'static str, result: Result<T, AuthError>) -> Result<T, AuthError> {
    if let Err(AuthError::Authentication(reason)) = &result {
        tracing::warn!(operation, reason = %reason, "Authentication rejected");
    }
    result
}

#[async_trait]
impl<UR, RR, NS> AuthServicePort for AuthService<UR, RR, NS>
where
    UR: UserRepository,
    RR: RevocationRegistry,
    NS: NotificationSink,
{
    async fn register(&self, command: RegisterCommand) -> Result<UserProfile, AuthError> {
        if self
            .users
            .find_by_email(command.email.as_str())
            .await
            .map_err(|e| AuthError::io("look up user", e))?
            .is_some()
        {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self
            .password_hasher
            .hash(command.password.expose())
            .map_err(|e| AuthError::io("hash password", e))?;

        let user = self
            .users
            .create(NewUser {
                name: command.name,
                email: command.email,
                age: command.age,
                phone: command.phone,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::DuplicateEmail(_) => AuthError::DuplicateEmail,
                other => AuthError::io("create user", other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user.into())
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let email = required(email, "email")?;
        // Passwords are compared as given; whitespace is a valid password.
        if password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }

        let result: Result<TokenPair, AuthError> = async {
            let user = self
                .users
                .find_by_email(email)
                .await
                .map_err(|e| AuthError::io("look up user", e))?;

            let user = match user {
                Some(user) if self.verify_password(Some(&user), password)? => user,
                Some(_) => return Err(AuthFailure::InvalidCredentials.into()),
                None => {
                    self.verify_password(None, password)?;
                    return Err(AuthFailure::InvalidCredentials.into());
                }
            };

            let pair = self.issue_pair(&user.id)?;
            tracing::info!(user_id = %user.id, "User logged in");
            Ok(pair)
        }
        .await;

        log_rejection("login", result)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let result: Result<TokenPair, AuthError> = async {
            let claims = self.verify_session(refresh_token, TokenKind::Refresh).await?;
            let user_id = subject(&claims)?;

            if self
                .users
                .find_by_id(&user_id)
                .await
                .map_err(|e| AuthError::io("look up user", e))?
                .is_none()
            {
                return Err(AuthFailure::UnknownSubject.into());
            }

            let pair = self.issue_pair(&user_id)?;

            // Only the caller that actually revokes the old token may hand out
            // the new pair.
            let revoked_now = self
                .registry
                .revoke(&claims.jti, claims.expires_at_utc())
                .await
                .map_err(|e| AuthError::io("revoke refresh token", e))?;
            if !revoked_now {
                return Err(AuthFailure::Revoked.into());
            }

            tracing::info!(user_id = %user_id, token_id = %claims.jti, "Refresh token rotated");
            Ok(pair)
        }
        .await;

        log_rejection("refresh", result)
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let claims = match self.codec.parse_ignoring_expiry(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring logout with undecodable token");
                return Ok(());
            }
        };

        if claims.is_expired(self.codec.now().timestamp()) {
            tracing::debug!(token_id = %claims.jti, "Logout of expired token, nothing to revoke");
            return Ok(());
        }

        self.registry
            .revoke(&claims.jti, claims.expires_at_utc())
            .await
            .map_err(|e| AuthError::io("revoke token", e))?;

        tracing::info!(
            user_id = %claims.sub,
            kind = %claims.kind,
            token_id = %claims.jti,
            "Token revoked on logout"
        );

        Ok(())
    }

    async fn forgot_password(&self, email: &str) -> Result<ResetTicket, AuthError> {
        let email = EmailAddress::new(required(email, "email")?.to_string())
            .map_err(ValidationError::from)?;

        let ticket = self
            .reset_tokens
            .issue(email.as_str())
            .await
            .map_err(|e| match e {
                ResetTokenError::NotFound => {
                    tracing::info!("Password reset requested for unknown email");
                    AuthError::NotFound
                }
                ResetTokenError::Signing(msg) => AuthError::Config(msg),
                other => AuthError::io("issue reset token", other),
            })?;

        self.notifications
            .send_password_reset(&ticket)
            .await
            .map_err(|e| AuthError::io("send reset notification", e))?;

        tracing::info!(expires_at = %ticket.expires_at, "Password reset token issued");

        Ok(ticket)
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let token = required(token, "token")?;
        let new_password = Password::new(new_password.to_string()).map_err(ValidationError::from)?;

        let result: Result<(), AuthError> = async {
            let redemption = self.reset_tokens.redeem(token).await.map_err(|e| match e {
                ResetTokenError::Malformed(_) => AuthFailure::Malformed.into(),
                ResetTokenError::InvalidSignature(_) => AuthFailure::InvalidSignature.into(),
                ResetTokenError::Expired => AuthFailure::Expired.into(),
                ResetTokenError::AlreadyUsed => AuthFailure::AlreadyUsed.into(),
                other => AuthError::io("validate reset token", other),
            })?;

            let password_hash = self
                .password_hasher
                .hash(new_password.expose())
                .map_err(|e| AuthError::io("hash password", e))?;

            self.users
                .update_password(redemption.email(), &password_hash)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound(_) => AuthFailure::UnknownSubject.into(),
                    other => AuthError::io("update password", other),
                })?;

            redemption.consume().await.map_err(|e| match e {
                ResetTokenError::AlreadyUsed => AuthFailure::AlreadyUsed.into(),
                other => AuthError::io("consume reset token", other),
            })?;

            tracing::info!("Password reset completed");
            Ok(())
        }
        .await;

        log_rejection("reset_password", result)
    }

    async fn authorize(&self, access_token: &str) -> Result<Principal, AuthError> {
        let result: Result<Principal, AuthError> = async {
            let claims = self.verify_session(access_token, TokenKind::Access).await?;

            Ok(Principal {
                user_id: subject(&claims)?,
                expires_at: claims.expires_at_utc(),
                token_id: claims.jti,
            })
        }
        .await;

        log_rejection("authorize", result)
    }

    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, AuthError> {
        self.users
            .find_by_id(id)
            .await
            .map_err(|e| AuthError::io("look up user", e))?
            .map(UserProfile::from)
            .ok_or(AuthError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use auth::Clock;
    use auth::JwtHandler;
    use auth::ManualClock;
    use auth::SystemClock;
    use chrono::DateTime;
    use chrono::Duration;
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::domain::reset::errors::NotificationError;
    use crate::domain::revocation::errors::RevocationError;
    use crate::domain::user::models::DisplayName;
    use crate::domain::user::models::User;
    use crate::outbound::repositories::InMemoryUserRepository;
    use crate::outbound::revocation::InMemoryRevocationRegistry;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
            async fn update_password(&self, email: &str, password_hash: &str) -> Result<(), RepositoryError>;
        }
    }

    mock! {
        pub TestRevocationRegistry {}

        #[async_trait]
        impl RevocationRegistry for TestRevocationRegistry {
            async fn revoke(&self, key: &str, expires_at: DateTime<Utc>) -> Result<bool, RevocationError>;
            async fn is_revoked(&self, key: &str) -> Result<bool, RevocationError>;
            async fn purge_expired(&self) -> Result<u64, RevocationError>;
        }
    }

    mock! {
        pub TestNotificationSink {}

        #[async_trait]
        impl NotificationSink for TestNotificationSink {
            async fn send_password_reset(&self, ticket: &ResetTicket) -> Result<(), NotificationError>;
        }
    }

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn cheap_hasher() -> PasswordHasher {
        PasswordHasher::with_params(8 * 1024, 1, 1).unwrap()
    }

    fn stored_user(email: &str, password: &str) -> User {
        User {
            id: UserId::new(),
            name: DisplayName::new("Ada".to_string()).unwrap(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            age: None,
            phone: None,
            password_hash: cheap_hasher().hash(password).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn register_command(email: &str) -> RegisterCommand {
        RegisterCommand::new(
            "Ada".to_string(),
            email.to_string(),
            "longpass1".to_string(),
            None,
            None,
        )
        .unwrap()
    }

    struct Harness<UR: UserRepository> {
        service: AuthService<UR, InMemoryRevocationRegistry, MockTestNotificationSink>,
        codec: Arc<TokenCodec>,
        clock: Arc<ManualClock>,
    }

    fn harness<UR: UserRepository>(users: UR, notifications: MockTestNotificationSink) -> Harness<UR> {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = Arc::new(TokenCodec::new(
            JwtHandler::new(SECRET).unwrap(),
            clock.clone(),
        ));
        let registry = Arc::new(InMemoryRevocationRegistry::new(clock.clone()));

        let service = AuthService::new(
            Arc::new(users),
            registry,
            Arc::new(notifications),
            Arc::clone(&codec),
            AuthSettings::default(),
        )
        .with_password_hasher(cheap_hasher());

        Harness {
            service,
            codec,
            clock,
        }
    }

    fn repository_with(user: User) -> MockTestUserRepository {
        let mut repository = MockTestUserRepository::new();
        let by_email = user.clone();
        repository
            .expect_find_by_email()
            .returning(move |email| {
                Ok((by_email.email.as_str() == email).then(|| by_email.clone()))
            });
        let by_id = user;
        repository
            .expect_find_by_id()
            .returning(move |id| Ok((by_id.id == *id).then(|| by_id.clone())));
        repository
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "ada@x.com" && user.password_hash.starts_with("$argon2id$")
            })
            .times(1)
            .returning(|user| {
                Ok(User {
                    id: UserId::new(),
                    name: user.name,
                    email: user.email,
                    age: user.age,
                    phone: user.phone,
                    password_hash: user.password_hash,
                    created_at: Utc::now(),
                })
            });

        let harness = harness(repository, MockTestNotificationSink::new());

        let profile = harness
            .service
            .register(register_command("ada@x.com"))
            .await
            .unwrap();
        assert_eq!(profile.name.as_str(), "Ada");
        assert_eq!(profile.email.as_str(), "ada@x.com");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut repository = repository_with(stored_user("ada@x.com", "longpass1"));
        repository.expect_create().times(0);

        let harness = harness(repository, MockTestNotificationSink::new());

        let result = harness.service.register(register_command("ada@x.com")).await;
        assert_eq!(result.unwrap_err(), AuthError::DuplicateEmail);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_race() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_email().returning(|_| Ok(None));
        repository
            .expect_create()
            .times(1)
            .returning(|user| Err(RepositoryError::DuplicateEmail(user.email.to_string())));

        let harness = harness(repository, MockTestNotificationSink::new());

        let result = harness.service.register(register_command("ada@x.com")).await;
        assert_eq!(result.unwrap_err(), AuthError::DuplicateEmail);
    }

    #[tokio::test]
    async fn test_register_store_failure() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_email().returning(|_| Ok(None));
        repository
            .expect_create()
            .returning(|_| Err(RepositoryError::Database("connection reset".to_string())));

        let harness = harness(repository, MockTestNotificationSink::new());

        let result = harness.service.register(register_command("ada@x.com")).await;
        assert!(matches!(
            result,
            Err(AuthError::Io {
                context: "create user",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_login_success() {
        let user = stored_user("ada@x.com", "longpass1");
        let user_id = user.id;
        let harness = harness(repository_with(user), MockTestNotificationSink::new());

        let pair = harness
            .service
            .login("ada@x.com", "longpass1")
            .await
            .unwrap();
        assert_eq!(pair.access_expires_at, harness.clock.now() + Duration::hours(2));
        assert_eq!(pair.refresh_expires_at, harness.clock.now() + Duration::days(7));

        let principal = harness.service.authorize(&pair.access_token).await.unwrap();
        assert_eq!(principal.user_id, user_id);
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email_look_the_same() {
        let harness = harness(
            repository_with(stored_user("ada@x.com", "longpass1")),
            MockTestNotificationSink::new(),
        );

        let wrong_password = harness
            .service
            .login("ada@x.com", "wrong")
            .await
            .unwrap_err();
        let unknown_email = harness
            .service
            .login("bob@x.com", "longpass1")
            .await
            .unwrap_err();

        assert_eq!(wrong_password, AuthError::Authentication(AuthFailure::InvalidCredentials));
        assert_eq!(wrong_password, unknown_email);
    }

    #[tokio::test]
    async fn test_login_empty_fields() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_email().times(0);
        let harness = harness(repository, MockTestNotificationSink::new());

        assert_eq!(
            harness.service.login("", "longpass1").await.unwrap_err(),
            AuthError::Validation(ValidationError::MissingField("email"))
        );
        assert_eq!(
            harness.service.login("ada@x.com", "").await.unwrap_err(),
            AuthError::Validation(ValidationError::MissingField("password"))
        );
    }

    #[tokio::test]
    async fn test_whitespace_password_round_trip() {
        let harness = harness(
            InMemoryUserRepository::new(Arc::new(SystemClock)),
            MockTestNotificationSink::new(),
        );
        let command = RegisterCommand::new(
            "Ada".to_string(),
            "ada@x.com".to_string(),
            "        ".to_string(),
            None,
            None,
        )
        .unwrap();

        harness.service.register(command).await.unwrap();

        assert!(harness.service.login("ada@x.com", "        ").await.is_ok());
        assert_eq!(
            harness
                .service
                .login("ada@x.com", "         ")
                .await
                .unwrap_err()
                .failure(),
            Some(AuthFailure::InvalidCredentials)
        );
    }

    #[test]
    fn test_unknown_email_verifies_against_dummy_hash() {
        let harness = harness(MockTestUserRepository::new(), MockTestNotificationSink::new());
        let service = &harness.service;

        let dummy = service.dummy_hash.as_deref().expect("dummy hash prepared");
        assert!(dummy.starts_with("$argon2id$"));
        // Same cost parameters as the configured hasher.
        assert!(dummy.contains("m=8192,t=1,p=1"));
        assert!(!service.password_hasher.verify("longpass1", dummy).unwrap());
        assert!(!service.verify_password(None, "longpass1").unwrap());
    }

    #[tokio::test]
    async fn test_unknown_email_costs_as_much_as_wrong_password() {
        let hasher = PasswordHasher::new();
        let mut user = stored_user("ada@x.com", "longpass1");
        user.password_hash = hasher.hash("longpass1").unwrap();

        let harness = harness(repository_with(user), MockTestNotificationSink::new());
        let service = harness.service.with_password_hasher(hasher);

        let mut wrong_password = std::time::Duration::ZERO;
        let mut unknown_email = std::time::Duration::ZERO;
        for _ in 0..3 {
            let started = std::time::Instant::now();
            assert!(service.login("ada@x.com", "wrong-password").await.is_err());
            wrong_password += started.elapsed();

            let started = std::time::Instant::now();
            assert!(service.login("bob@x.com", "wrong-password").await.is_err());
            unknown_email += started.elapsed();
        }

        assert!(
            unknown_email * 4 >= wrong_password,
            "unknown email took {:?}, wrong password took {:?}",
            unknown_email,
            wrong_password
        );
    }

    #[tokio::test]
    async fn test_refresh_is_single_use() {
        let harness = harness(
            repository_with(stored_user("ada@x.com", "longpass1")),
            MockTestNotificationSink::new(),
        );
        let pair = harness
            .service
            .login("ada@x.com", "longpass1")
            .await
            .unwrap();

        let rotated = harness.service.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);
        assert!(harness.service.authorize(&rotated.access_token).await.is_ok());

        let replay = harness.service.refresh(&pair.refresh_token).await;
        assert_eq!(replay.unwrap_err().failure(), Some(AuthFailure::Revoked));

        assert!(harness.service.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let harness = harness(
            repository_with(stored_user("ada@x.com", "longpass1")),
            MockTestNotificationSink::new(),
        );
        let pair = harness
            .service
            .login("ada@x.com", "longpass1")
            .await
            .unwrap();

        let result = harness.service.refresh(&pair.access_token).await;
        assert_eq!(result.unwrap_err().failure(), Some(AuthFailure::WrongKind));

        let result = harness.service.authorize(&pair.refresh_token).await;
        assert_eq!(result.unwrap_err().failure(), Some(AuthFailure::WrongKind));
    }

    #[tokio::test]
    async fn test_refresh_expired_and_malformed() {
        let harness = harness(
            repository_with(stored_user("ada@x.com", "longpass1")),
            MockTestNotificationSink::new(),
        );
        let pair = harness
            .service
            .login("ada@x.com", "longpass1")
            .await
            .unwrap();

        let result = harness.service.refresh("not-a-token").await;
        assert_eq!(result.unwrap_err().failure(), Some(AuthFailure::Malformed));

        harness.clock.advance(Duration::days(7) + Duration::seconds(1));
        let result = harness.service.refresh(&pair.refresh_token).await;
        assert_eq!(result.unwrap_err().failure(), Some(AuthFailure::Expired));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_user() {
        let user = stored_user("ada@x.com", "longpass1");
        let harness = harness(repository_with(user), MockTestNotificationSink::new());
        let orphan = harness
            .codec
            .issue(UserId::new(), TokenKind::Refresh, Duration::days(7))
            .unwrap();

        let result = harness.service.refresh(&orphan.token).await;
        assert_eq!(result.unwrap_err().failure(), Some(AuthFailure::UnknownSubject));
    }

    #[tokio::test]
    async fn test_access_token_expires() {
        let harness = harness(
            repository_with(stored_user("ada@x.com", "longpass1")),
            MockTestNotificationSink::new(),
        );
        let pair = harness
            .service
            .login("ada@x.com", "longpass1")
            .await
            .unwrap();

        harness.clock.advance(Duration::hours(2));
        assert!(harness.service.authorize(&pair.access_token).await.is_ok());

        harness.clock.advance(Duration::seconds(1));
        let result = harness.service.authorize(&pair.access_token).await;
        assert_eq!(result.unwrap_err().failure(), Some(AuthFailure::Expired));
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let harness = harness(
            repository_with(stored_user("ada@x.com", "longpass1")),
            MockTestNotificationSink::new(),
        );
        let pair = harness
            .service
            .login("ada@x.com", "longpass1")
            .await
            .unwrap();

        harness.service.logout(&pair.access_token).await.unwrap();
        let result = harness.service.authorize(&pair.access_token).await;
        assert_eq!(result.unwrap_err().failure(), Some(AuthFailure::Revoked));

        // Idempotent.
        harness.service.logout(&pair.access_token).await.unwrap();

        harness.service.logout(&pair.refresh_token).await.unwrap();
        let result = harness.service.refresh(&pair.refresh_token).await;
        assert_eq!(result.unwrap_err().failure(), Some(AuthFailure::Revoked));
    }

    #[tokio::test]
    async fn test_logout_ignores_garbage_and_expired_tokens() {
        let mut registry = MockTestRevocationRegistry::new();
        registry.expect_revoke().times(0);

        let clock = Arc::new(ManualClock::starting_now());
        let codec = Arc::new(TokenCodec::new(
            JwtHandler::new(SECRET).unwrap(),
            clock.clone(),
        ));
        let service = AuthService::new(
            Arc::new(MockTestUserRepository::new()),
            Arc::new(registry),
            Arc::new(MockTestNotificationSink::new()),
            Arc::clone(&codec),
            AuthSettings::default(),
        );

        let expired = codec
            .issue(UserId::new(), TokenKind::Access, Duration::minutes(1))
            .unwrap();
        clock.advance(Duration::minutes(2));

        assert!(service.logout("garbage").await.is_ok());
        assert!(service.logout(&expired.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_authorize_registry_failure() {
        let mut registry = MockTestRevocationRegistry::new();
        registry
            .expect_is_revoked()
            .returning(|_| Err(RevocationError::Storage("timeout".to_string())));

        let clock = Arc::new(ManualClock::starting_now());
        let codec = Arc::new(TokenCodec::new(
            JwtHandler::new(SECRET).unwrap(),
            clock.clone(),
        ));
        let service = AuthService::new(
            Arc::new(MockTestUserRepository::new()),
            Arc::new(registry),
            Arc::new(MockTestNotificationSink::new()),
            Arc::clone(&codec),
            AuthSettings::default(),
        );
        let access = codec
            .issue(UserId::new(), TokenKind::Access, Duration::hours(2))
            .unwrap();

        let result = service.authorize(&access.token).await;
        assert!(matches!(result, Err(AuthError::Io { .. })));
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let mut notifications = MockTestNotificationSink::new();
        notifications.expect_send_password_reset().times(0);
        let harness = harness(
            repository_with(stored_user("ada@x.com", "longpass1")),
            notifications,
        );

        let result = harness.service.forgot_password("bob@x.com").await;
        assert_eq!(result.unwrap_err(), AuthError::NotFound);
    }

    #[tokio::test]
    async fn test_forgot_password_invalid_email() {
        let harness = harness(MockTestUserRepository::new(), MockTestNotificationSink::new());

        assert!(matches!(
            harness.service.forgot_password("").await,
            Err(AuthError::Validation(ValidationError::MissingField("email")))
        ));
        assert!(matches!(
            harness.service.forgot_password("ada-at-x").await,
            Err(AuthError::Validation(ValidationError::Email(_)))
        ));
    }

    #[tokio::test]
    async fn test_forgot_password_notification_failure() {
        let mut notifications = MockTestNotificationSink::new();
        notifications
            .expect_send_password_reset()
            .times(1)
            .returning(|_| Err(NotificationError::DeliveryFailed("smtp down".to_string())));
        let harness = harness(
            repository_with(stored_user("ada@x.com", "longpass1")),
            notifications,
        );

        let result = harness.service.forgot_password("ada@x.com").await;
        assert!(matches!(
            result,
            Err(AuthError::Io {
                context: "send reset notification",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_reset_password_once() {
        let mut repository = repository_with(stored_user("ada@x.com", "longpass1"));
        repository
            .expect_update_password()
            .withf(|email, hash| email == "ada@x.com" && hash.starts_with("$argon2id$"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut notifications = MockTestNotificationSink::new();
        notifications
            .expect_send_password_reset()
            .withf(|ticket| ticket.email == "ada@x.com")
            .times(1)
            .returning(|_| Ok(()));

        let harness = harness(repository, notifications);

        let ticket = harness.service.forgot_password("ada@x.com").await.unwrap();
        harness
            .service
            .reset_password(&ticket.token, "newpass12")
            .await
            .unwrap();

        let second = harness
            .service
            .reset_password(&ticket.token, "newpass34")
            .await;
        assert_eq!(second.unwrap_err().failure(), Some(AuthFailure::AlreadyUsed));
    }

    #[tokio::test]
    async fn test_reset_password_validates_before_touching_token() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_update_password().times(0);
        let harness = harness(repository, MockTestNotificationSink::new());

        assert!(matches!(
            harness.service.reset_password("whatever", "short").await,
            Err(AuthError::Validation(ValidationError::Password(_)))
        ));
        assert_eq!(
            harness
                .service
                .reset_password("", "newpass12")
                .await
                .unwrap_err(),
            AuthError::Validation(ValidationError::MissingField("token"))
        );
    }

    #[tokio::test]
    async fn test_failed_password_update_keeps_token_usable() {
        let mut repository = repository_with(stored_user("ada@x.com", "longpass1"));
        let mut attempts = 0;
        repository
            .expect_update_password()
            .times(2)
            .returning(move |_, _| {
                attempts += 1;
                if attempts == 1 {
                    Err(RepositoryError::Database("connection reset".to_string()))
                } else {
                    Ok(())
                }
            });
        let mut notifications = MockTestNotificationSink::new();
        notifications
            .expect_send_password_reset()
            .returning(|_| Ok(()));

        let harness = harness(repository, notifications);
        let ticket = harness.service.forgot_password("ada@x.com").await.unwrap();

        let failed = harness
            .service
            .reset_password(&ticket.token, "newpass12")
            .await;
        assert!(matches!(failed, Err(AuthError::Io { .. })));

        harness
            .service
            .reset_password(&ticket.token, "newpass12")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_token_is_not_a_session_token() {
        let mut notifications = MockTestNotificationSink::new();
        notifications
            .expect_send_password_reset()
            .returning(|_| Ok(()));
        let harness = harness(
            repository_with(stored_user("ada@x.com", "longpass1")),
            notifications,
        );

        let ticket = harness.service.forgot_password("ada@x.com").await.unwrap();

        let result = harness.service.authorize(&ticket.token).await;
        assert_eq!(result.unwrap_err().failure(), Some(AuthFailure::Malformed));
    }

    #[tokio::test]
    async fn test_get_profile() {
        let user = stored_user("ada@x.com", "longpass1");
        let user_id = user.id;
        let harness = harness(repository_with(user), MockTestNotificationSink::new());

        let profile = harness.service.get_profile(&user_id).await.unwrap();
        assert_eq!(profile.email.as_str(), "ada@x.com");

        let missing = harness.service.get_profile(&UserId::new()).await;
        assert_eq!(missing.unwrap_err(), AuthError::NotFound);
    }

    #[tokio::test]
    async fn test_account_lifecycle_with_simulated_clock() {
        let mut notifications = MockTestNotificationSink::new();
        notifications
            .expect_send_password_reset()
            .returning(|_| Ok(()));

        let harness = harness(
            InMemoryUserRepository::new(Arc::new(SystemClock)),
            notifications,
        );
        let service = &harness.service;

        let profile = service.register(register_command("ada@x.com")).await.unwrap();
        assert_eq!(profile.name.as_str(), "Ada");

        let pair = service.login("ada@x.com", "longpass1").await.unwrap();
        assert!(service.authorize(&pair.access_token).await.is_ok());

        let wrong = service.login("ada@x.com", "wrong").await.unwrap_err();
        assert_eq!(wrong.failure(), Some(AuthFailure::InvalidCredentials));

        service.logout(&pair.access_token).await.unwrap();
        assert_eq!(
            service
                .authorize(&pair.access_token)
                .await
                .unwrap_err()
                .failure(),
            Some(AuthFailure::Revoked)
        );

        let ticket = service.forgot_password("ada@x.com").await.unwrap();
        harness.clock.advance(Duration::minutes(16));

        let result = service.reset_password(&ticket.token, "newpass1").await;
        assert_eq!(result.unwrap_err().failure(), Some(AuthFailure::Expired));

        assert!(service.login("ada@x.com", "longpass1").await.is_ok());
    }
}
