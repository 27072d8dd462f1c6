//! Error types for identity parsing.

use thiserror::Error;

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors that can occur while building identities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The identity string was empty or only whitespace.
    #[error("identity id must not be empty")]
    Empty,
}
