//! Error types for Threadgate Core.

use thiserror::Error;

/// Core errors that can occur while handling keys, identities and entries.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("malformed identity: {0}")]
    MalformedIdentity(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("identity resolution failed: {0}")]
    Resolution(String),
}

/// Validation errors for entry structure and signatures.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("entry signature verification failed")]
    SignatureFailed,

    #[error("entry carries a malformed signing key")]
    MalformedPublicKey,

    #[error("structural error: {0}")]
    StructuralError(String),

    #[error("entry clock {clock} outside accepted range 1..={limit}")]
    ClockOutOfRange { clock: u64, limit: u64 },
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSignature => ValidationError::SignatureFailed,
            CoreError::InvalidPublicKey | CoreError::InvalidLength { .. } => {
                ValidationError::MalformedPublicKey
            }
            other => ValidationError::StructuralError(other.to_string()),
        }
    }
}
