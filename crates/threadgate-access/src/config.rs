//! Access configuration.

use serde::{Deserialize, Serialize};

use threadgate_core::IdentityId;

use crate::error::{AccessError, Result};

/// The trust anchor of a thread.
///
/// Created once when the thread is created and carried in its manifest.
/// A missing or empty `first_moderator` is rejected by [`validate`](Self::validate),
/// which every constructor of the access components calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    /// The bootstrap moderator, trusted without a grant entry.
    #[serde(default)]
    pub first_moderator: IdentityId,

    /// Whether writing requires the MEMBER capability.
    #[serde(default)]
    pub members_only: bool,

    /// Id of the thread read key. Present iff the thread is confidential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc_key_id: Option<String>,
}

impl AccessConfig {
    /// An open, non-confidential thread moderated by `first_moderator`.
    pub fn new(first_moderator: impl Into<IdentityId>) -> Self {
        Self {
            first_moderator: first_moderator.into(),
            members_only: false,
            enc_key_id: None,
        }
    }

    pub fn with_members_only(mut self, members_only: bool) -> Self {
        self.members_only = members_only;
        self
    }

    pub fn with_enc_key_id(mut self, enc_key_id: impl Into<String>) -> Self {
        self.enc_key_id = Some(enc_key_id.into());
        self
    }

    /// Whether grants must carry a wrapped read key.
    pub fn is_confidential(&self) -> bool {
        self.enc_key_id.is_some()
    }

    /// Check that the bootstrap moderator is present.
    pub fn validate(&self) -> Result<()> {
        if self.first_moderator.is_empty() {
            return Err(AccessError::Config(
                "a bootstrap moderator id is required".into(),
            ));
        }
        if self.enc_key_id.as_deref() == Some("") {
            return Err(AccessError::Config("encryption key id is empty".into()));
        }
        Ok(())
    }
}
