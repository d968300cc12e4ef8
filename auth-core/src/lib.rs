//! Authentication core
//!
//! Store-agnostic building blocks for credential checks:
//! - Password hashing (Argon2id)
//! - Signed, time-bound access tokens (HS256 JWT carrying `sub` and `exp`)
//! - Authentication coordination (verify credentials, then issue a token)
//!
//! Services own their user records and call into these primitives; nothing in
//! this crate touches storage or keeps global state.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth_core::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth_core::JwtHandler;
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!");
//! let token = handler.issue("user123").unwrap();
//! let subject = handler.validate(&token.access_token).unwrap();
//! assert_eq!(subject, "user123");
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth_core::Authenticator;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!");
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue token
//! let token = auth.authenticate("password123", &hash, "user123").unwrap();
//!
//! // Validate token
//! let subject = auth.validate_token(&token.access_token).unwrap();
//! assert_eq!(subject, "user123");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::IssuedToken;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenClaims;
pub use password::PasswordError;
pub use password::PasswordHasher;
