use std::sync::Arc;

use async_trait::async_trait;
use auth_core::AuthenticationError;
use auth_core::Authenticator;

use crate::domain::user::models::AccessToken;
use crate::domain::user::models::Credentials;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::user::errors::UserError;
use crate::user::ports::AuthServicePort;
use crate::user::ports::UserRepository;

/// Domain service implementation for registration and authentication.
///
/// Concrete implementation of AuthServicePort with dependency injection:
/// the credential store and the token secret are supplied at construction.
pub struct AuthService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
}

impl<UR> AuthService<UR>
where
    UR: UserRepository,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store implementation
    /// * `authenticator` - Password hashing and token signing
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }
}

#[async_trait]
impl<UR> AuthServicePort for AuthService<UR>
where
    UR: UserRepository,
{
    async fn register_user(&self, command: RegisterUserCommand) -> Result<UserProfile, UserError> {
        if self
            .repository
            .find_by_email(command.email.as_str())
            .await?
            .is_some()
        {
            tracing::info!(email = %command.email, "Registration rejected: email already registered");
            return Err(UserError::DuplicateUser(command.email.to_string()));
        }

        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;
        let password_hash =
            tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
                .await
                .map_err(|e| UserError::Unknown(format!("Password hashing task failed: {}", e)))?
                .map_err(|e| UserError::Unknown(format!("Password hashing failed: {}", e)))?;

        let user_id = self
            .repository
            .insert(NewUser {
                username: command.username,
                email: command.email,
                password_hash,
            })
            .await?;

        let user = self
            .repository
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| UserError::Unknown(format!("User {} missing after insert", user_id)))?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user.into())
    }

    async fn get_user(&self, id: &str) -> Result<UserProfile, UserError> {
        let user_id = UserId::from_string(id).map_err(|e| {
            tracing::debug!(id = %id, error = %e, "Rejected malformed user id");
            UserError::NotFound(id.to_string())
        })?;

        self.repository
            .find_by_id(&user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    async fn login(&self, credentials: Credentials) -> Result<AccessToken, UserError> {
        let Some(user) = self.repository.find_by_email(&credentials.email).await? else {
            tracing::debug!(reason = "unknown_email", "Login rejected");
            return Err(UserError::AuthenticationFailed);
        };

        // Argon2 verification is CPU-bound; keep it off the async workers.
        let authenticator = Arc::clone(&self.authenticator);
        let password = credentials.password;
        let password_hash = user.password_hash.clone();
        let subject = user.id.to_string();
        let outcome = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, &password_hash, &subject)
        })
        .await
        .map_err(|e| UserError::Unknown(format!("Credential check task failed: {}", e)))?;

        match outcome {
            Ok(token) => {
                tracing::info!(user_id = %user.id, "Access token issued");
                Ok(token.into())
            }
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::debug!(user_id = %user.id, reason = "password_mismatch", "Login rejected");
                Err(UserError::AuthenticationFailed)
            }
            Err(AuthenticationError::JwtError(e)) => {
                Err(UserError::Unknown(format!("Token generation failed: {}", e)))
            }
        }
    }

    async fn resolve_current_user(&self, token: &str) -> Result<UserProfile, UserError> {
        let subject = self.authenticator.validate_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            UserError::AuthenticationFailed
        })?;

        let user_id = UserId::from_string(&subject).map_err(|e| {
            tracing::warn!(error = %e, "Token subject is not a user id");
            UserError::AuthenticationFailed
        })?;

        self.repository
            .find_by_id(&user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| {
                tracing::debug!(user_id = %user_id, "Token subject no longer exists");
                UserError::AuthenticationFailed
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::User;
    use crate::domain::user::models::Username;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn insert(&self, user: NewUser) -> Result<UserId, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(Authenticator::new(SECRET))
    }

    fn stored_user(authenticator: &Authenticator, email: &str, password: &str) -> User {
        User {
            id: UserId::new(),
            username: Username::new("testuser".to_string()).unwrap(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash: authenticator.hash_password(password).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn register_command(email: &str) -> RegisterUserCommand {
        RegisterUserCommand::new(
            EmailAddress::new(email.to_string()).unwrap(),
            Username::new("testuser".to_string()).unwrap(),
            "password123".to_string(),
        )
    }

    #[tokio::test]
    async fn test_register_user_success() {
        let mut repository = MockTestUserRepository::new();
        let user_id = UserId::new();

        repository
            .expect_find_by_email()
            .withf(|email| email == "test@example.com")
            .times(1)
            .returning(|_| Ok(None));

        repository
            .expect_insert()
            .withf(|user| {
                user.username.as_str() == "testuser"
                    && user.email.as_str() == "test@example.com"
                    && user.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(move |_| Ok(user_id));

        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |id| {
                Ok(Some(User {
                    id: *id,
                    username: Username::new("testuser".to_string()).unwrap(),
                    email: EmailAddress::new("test@example.com".to_string()).unwrap(),
                    password_hash: "$argon2id$stored".to_string(),
                    created_at: Utc::now(),
                }))
            });

        let service = AuthService::new(Arc::new(repository), authenticator());

        let profile = service
            .register_user(register_command("test@example.com"))
            .await
            .expect("Registration failed");

        assert_eq!(profile.id, user_id);
        assert_eq!(profile.username.as_str(), "testuser");
        assert_eq!(profile.email.as_str(), "test@example.com");
    }

    #[tokio::test]
    async fn test_register_user_duplicate_email() {
        let mut repository = MockTestUserRepository::new();
        let existing = stored_user(&Authenticator::new(SECRET), "test@example.com", "other");

        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository.expect_insert().times(0);

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service
            .register_user(register_command("test@example.com"))
            .await;

        assert_eq!(
            result,
            Err(UserError::DuplicateUser("test@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_register_user_duplicate_detected_by_store() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_insert()
            .times(1)
            .returning(|user| Err(UserError::DuplicateUser(user.email.to_string())));
        repository.expect_find_by_id().times(0);

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service
            .register_user(register_command("test@example.com"))
            .await;

        assert!(matches!(result, Err(UserError::DuplicateUser(_))));
    }

    #[tokio::test]
    async fn test_register_user_store_unavailable() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Err(UserError::StoreUnavailable("connection refused".to_string())));

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service
            .register_user(register_command("test@example.com"))
            .await;

        assert!(matches!(result, Err(UserError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_get_user_success() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(&Authenticator::new(SECRET), "test@example.com", "pw");
        let user_id = user.id;

        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = AuthService::new(Arc::new(repository), authenticator());

        let profile = service
            .get_user(&user_id.to_string())
            .await
            .expect("Lookup failed");

        assert_eq!(profile.id, user_id);
        assert_eq!(profile.email.as_str(), "test@example.com");
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service.get_user(&UserId::new().to_string()).await;

        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_user_malformed_id_skips_store() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().times(0);

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service.get_user("not-a-valid-id").await;

        assert_eq!(
            result,
            Err(UserError::NotFound("not-a-valid-id".to_string()))
        );
    }

    #[tokio::test]
    async fn test_login_then_resolve_current_user() {
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "test@example.com", "password123");
        let user_id = user.id;

        let mut repository = MockTestUserRepository::new();
        let by_email = user.clone();
        repository
            .expect_find_by_email()
            .withf(|email| email == "test@example.com")
            .times(1)
            .returning(move |_| Ok(Some(by_email.clone())));
        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = AuthService::new(Arc::new(repository), Arc::clone(&authenticator));

        let token = service
            .login(Credentials::new("test@example.com", "password123"))
            .await
            .expect("Login failed");
        assert_eq!(token.token_type, "bearer");
        assert_eq!(
            authenticator.validate_token(&token.access_token),
            Ok(user_id.to_string())
        );

        let profile = service
            .resolve_current_user(&token.access_token)
            .await
            .expect("Token resolution failed");
        assert_eq!(profile.id, user_id);
        assert_eq!(profile.email.as_str(), "test@example.com");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "realuser@x.com", "rightpass");

        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_email().returning(move |email| {
            if email == "realuser@x.com" {
                Ok(Some(user.clone()))
            } else {
                Ok(None)
            }
        });

        let service = AuthService::new(Arc::new(repository), authenticator);

        let unknown = service
            .login(Credentials::new("nouser@x.com", "anything"))
            .await;
        let mismatch = service
            .login(Credentials::new("realuser@x.com", "wrongpass"))
            .await;

        assert_eq!(unknown, Err(UserError::AuthenticationFailed));
        assert_eq!(mismatch, Err(UserError::AuthenticationFailed));
        assert_eq!(
            unknown.unwrap_err().to_string(),
            mismatch.unwrap_err().to_string()
        );
    }

    #[tokio::test]
    async fn test_login_email_is_case_sensitive() {
        let authenticator = authenticator();
        let user = stored_user(&authenticator, "alice@example.com", "password123");

        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_email().returning(move |email| {
            Ok((email == user.email.as_str()).then(|| user.clone()))
        });

        let service = AuthService::new(Arc::new(repository), authenticator);

        let result = service
            .login(Credentials::new("Alice@Example.com", "password123"))
            .await;

        assert_eq!(result, Err(UserError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_login_store_unavailable_is_propagated() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .returning(|_| Err(UserError::StoreUnavailable("timeout".to_string())));

        let service = AuthService::new(Arc::new(repository), authenticator());

        let result = service
            .login(Credentials::new("test@example.com", "password123"))
            .await;

        assert!(matches!(result, Err(UserError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_login_yields_while_verifying_password() {
        use std::sync::atomic::AtomicUsize;
        use std::sync::atomic::Ordering;

        let authenticator = authenticator();
        let user = stored_user(&authenticator, "test@example.com", "password123");

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let service = AuthService::new(Arc::new(repository), authenticator);

        // Single-threaded runtime: the ticker only runs if login gives up the
        // worker while Argon2 verifies the password.
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let ticker = tokio::spawn(async move {
            loop {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
            }
        });

        let token = service
            .login(Credentials::new("test@example.com", "password123"))
            .await
            .expect("Login failed");
        ticker.abort();

        assert!(!token.access_token.is_empty());
        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_resolve_current_user_tampered_token() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().times(0);

        let forger = Authenticator::new(b"another_secret_key_at_least_32_bytes");
        let forged = forger
            .issue_token(&UserId::new().to_string())
            .expect("Failed to issue token");

        let service = AuthService::new(Arc::new(repository), authenticator());

        assert_eq!(
            service.resolve_current_user(&forged.access_token).await,
            Err(UserError::AuthenticationFailed)
        );
        assert_eq!(
            service.resolve_current_user("garbage").await,
            Err(UserError::AuthenticationFailed)
        );
    }

    #[tokio::test]
    async fn test_resolve_current_user_stale_subject() {
        let authenticator = authenticator();
        let token = authenticator
            .issue_token(&UserId::new().to_string())
            .expect("Failed to issue token");

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(repository), authenticator);

        assert_eq!(
            service.resolve_current_user(&token.access_token).await,
            Err(UserError::AuthenticationFailed)
        );
    }

    #[tokio::test]
    async fn test_resolve_current_user_non_uuid_subject() {
        let authenticator = authenticator();
        let token = authenticator
            .issue_token("someone@example.com")
            .expect("Failed to issue token");

        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().times(0);

        let service = AuthService::new(Arc::new(repository), authenticator);

        assert_eq!(
            service.resolve_current_user(&token.access_token).await,
            Err(UserError::AuthenticationFailed)
        );
    }
}
