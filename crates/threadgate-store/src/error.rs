//! Error types for the store module.

use thiserror::Error;

use threadgate_core::{CoreError, EntryHash, ValidationError};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The log's access controller refused the entry.
    #[error("entry {hash} rejected by the access controller of {log}")]
    AccessDenied { log: String, hash: EntryHash },

    /// The entry failed structural or signature validation.
    #[error("invalid entry: {0}")]
    Validation(#[from] ValidationError),

    /// Encoding or key handling failed.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The log's clock cannot advance any further.
    #[error("clock of {log} is exhausted")]
    ClockExhausted { log: String },

    /// Entry not found.
    #[error("entry not found: {0}")]
    NotFound(String),

    /// The content store could not serve a request.
    #[error("content store error: {0}")]
    Content(String),
}

impl StoreError {
    /// Whether this error is a refusal by the access controller.
    ///
    /// Callers use this to tell an authorization decision apart from an
    /// I/O or encoding failure.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, StoreError::AccessDenied { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_is_distinguishable() {
        let denied = StoreError::AccessDenied {
            log: "/memlog/abc/grants".into(),
            hash: EntryHash::ZERO,
        };
        assert!(denied.is_access_denied());
        assert!(!StoreError::NotFound("x".into()).is_access_denied());
        assert!(!StoreError::Validation(ValidationError::SignatureFailed).is_access_denied());
    }
}
