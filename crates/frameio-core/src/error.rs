// ABOUTME: Error type shared by the frameio-core modules.
// ABOUTME: Covers credential hashing, identity key loading, and token verification failures.

use thiserror::Error;

/// Errors raised by core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid password hash: {0}")]
    InvalidPasswordHash(String),

    #[error("failed to hash password: {0}")]
    PasswordHash(String),

    #[error("invalid identity key: {0}")]
    InvalidIdentityKey(String),

    #[error("identity token rejected: {0}")]
    TokenRejected(#[from] jsonwebtoken::errors::Error),

    #[error("identity token authorized party {0:?} is not allowed")]
    UnauthorizedParty(Option<String>),
}
