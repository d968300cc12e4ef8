use thiserror::Error;

/// Error type for JWT operations.
///
/// Validation failures are deliberately collapsed into `InvalidToken`: a bad
/// signature, a malformed token and an expired token look the same to callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Invalid or expired token")]
    InvalidToken,
}
