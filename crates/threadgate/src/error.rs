//! Error types for threads.

use thiserror::Error;

use threadgate_access::{AccessError, GrantDenial};
use threadgate_core::{CoreError, EntryHash};
use threadgate_store::StoreError;

/// Errors that can occur during thread operations.
#[derive(Debug, Error)]
pub enum ThreadError {
    /// Access-control error (configuration, grants, manifests, keys).
    #[error("access error: {0}")]
    Access(#[from] AccessError),

    /// Storage error, including refusal of an append by the write gate.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Entry not found in the thread log.
    #[error("entry not found: {0}")]
    EntryNotFound(EntryHash),

    /// Invalid operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl ThreadError {
    /// Whether a thread log append was refused by the write gate.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ThreadError::Store(e) if e.is_access_denied())
    }

    /// The violated rule, if a grant was refused.
    pub fn grant_denial(&self) -> Option<GrantDenial> {
        match self {
            ThreadError::Access(e) => e.grant_denial(),
            _ => None,
        }
    }
}

/// Result type for thread operations.
pub type Result<T> = std::result::Result<T, ThreadError>;
