//! Structured validation errors for identity and credential inputs.

use thiserror::Error;

/// Errors raised when an input fails shape or format validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Not a well-formed 20-byte account address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Not a well-formed `did:sigil:<role>:<address>` identifier.
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// Not a valid role segment (lowercase alphanumeric).
    #[error("invalid role: {0:?}")]
    InvalidRole(String),

    /// Not a usable credential identifier.
    #[error("invalid credential id: {0:?}")]
    InvalidCredentialId(String),

    /// A credential type string was empty.
    #[error("credential type must not be empty")]
    EmptyCredentialType,

    /// A validity window of zero or negative length was requested.
    #[error("validity must be at least one day, got {0}")]
    InvalidValidityDays(i64),
}
