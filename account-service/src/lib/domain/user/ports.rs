use async_trait::async_trait;

use crate::domain::user::models::AccessToken;
use crate::domain::user::models::Credentials;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::user::errors::UserError;

/// Port for registration, lookup and authentication operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `command` - Validated command containing email, username, and password
    ///
    /// # Returns
    /// Created user, without password hash
    ///
    /// # Errors
    /// * `DuplicateUser` - Email is already registered
    /// * `StoreUnavailable` - Credential store operation failed
    async fn register_user(&self, command: RegisterUserCommand) -> Result<UserProfile, UserError>;

    /// Retrieve user by its external identifier.
    ///
    /// # Arguments
    /// * `id` - Opaque identifier string; validated before the store is queried
    ///
    /// # Errors
    /// * `NotFound` - Identifier is malformed or no such user exists
    /// * `StoreUnavailable` - Credential store operation failed
    async fn get_user(&self, id: &str) -> Result<UserProfile, UserError>;

    /// Verify credentials and issue an access token.
    ///
    /// # Errors
    /// * `AuthenticationFailed` - Unknown email or wrong password (indistinguishable)
    /// * `StoreUnavailable` - Credential store operation failed
    async fn login(&self, credentials: Credentials) -> Result<AccessToken, UserError>;

    /// Resolve the user a bearer token was issued for.
    ///
    /// # Errors
    /// * `AuthenticationFailed` - Token is invalid or expired, or its subject no longer exists
    /// * `StoreUnavailable` - Credential store operation failed
    async fn resolve_current_user(&self, token: &str) -> Result<UserProfile, UserError>;
}

/// Credential store operations for the user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user record.
    ///
    /// # Returns
    /// Identifier assigned by the store
    ///
    /// # Errors
    /// * `DuplicateUser` - Email is already registered
    /// * `StoreUnavailable` - Store operation failed
    async fn insert(&self, user: NewUser) -> Result<UserId, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `StoreUnavailable` - Store operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by exact email address.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `StoreUnavailable` - Store operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
}
