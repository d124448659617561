//! Error types for the protocol core.

use thiserror::Error;

/// Failure to parse a chain address from its textual form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid address: {0}")]
pub struct AddressError(pub String);

/// Failure to load or parse the creator key material.
#[derive(Debug, Error)]
#[error("invalid creator key: {0}")]
pub struct KeyError(pub String);

/// Errors raised while resolving an operation into an unsigned transaction.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The supplied account address is not a syntactically valid chain address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The operation name does not resolve to a known contract entry point.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

impl From<AddressError> for BuildError {
    fn from(err: AddressError) -> Self {
        BuildError::InvalidAddress(err.0)
    }
}

/// Errors raised by the server co-signer.
#[derive(Debug, Error)]
pub enum CoSignError {
    /// The creator key failed to load at process start. Permanent for the
    /// process lifetime; callers must not retry.
    #[error("co-signer unavailable: creator key not loaded")]
    Unavailable,

    /// The transaction does not delegate authority to this co-signer.
    #[error("signer mismatch: {0}")]
    SignerMismatch(String),
}

/// Errors raised while sealing or opening a transport envelope.
///
/// Deserialization fails closed: a malformed or truncated byte sequence never
/// yields a partially populated object.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Malformed(String),
}
