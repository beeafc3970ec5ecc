//! Error types for the access module.

use std::fmt;

use thiserror::Error;

use threadgate_core::{CoreError, IdentityId};
use threadgate_store::StoreError;

use crate::capability::Capability;

/// The rule that refused a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantDenial {
    /// The registry does not recognize the capability for this thread.
    InvalidCapability,
    /// The identity already holds the capability.
    AlreadyGranted,
    /// The thread is confidential and no wrapped read key was supplied.
    MissingReadKey,
    /// The grant log's access controller refused the entry.
    Refused,
}

impl fmt::Display for GrantDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GrantDenial::InvalidCapability => "capability not valid for this thread",
            GrantDenial::AlreadyGranted => "identity already holds this capability",
            GrantDenial::MissingReadKey => "confidential thread requires an encrypted read key",
            GrantDenial::Refused => "not authorized to grant",
        };
        f.write_str(s)
    }
}

/// Failures of read-key lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfidentialityError {
    /// The thread has no encryption key id.
    #[error("thread is not confidential")]
    NotConfidential,

    /// No grant carrying key material exists for the identity.
    #[error("no read key granted to {0}")]
    NoGrant(IdentityId),
}

/// Errors that can occur during access-control operations.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Invalid construction parameters.
    #[error("configuration error: {0}")]
    Config(String),

    /// A grant was refused.
    #[error("grant of {capability} to {id} denied: {reason}")]
    GrantDenied {
        capability: Capability,
        id: IdentityId,
        reason: GrantDenial,
    },

    /// Read-key lookup failed.
    #[error(transparent)]
    Confidentiality(#[from] ConfidentialityError),

    /// A manifest could not be encoded or decoded.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Encryption error.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Decryption error.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// The underlying log failed for a reason other than refusal.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl AccessError {
    /// The violated rule, if this is a grant denial.
    pub fn grant_denial(&self) -> Option<GrantDenial> {
        match self {
            AccessError::GrantDenied { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Whether this is a grant denial (as opposed to an I/O failure).
    pub fn is_grant_denied(&self) -> bool {
        self.grant_denial().is_some()
    }
}

/// Result type for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;
