//! Entry payloads of the grant log and the thread log.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use threadgate_core::{EntryHash, IdentityId};

use crate::capability::Capability;

/// Payload of a grant-log entry.
///
/// Appended once by a moderator through
/// [`GrantProtocol`](crate::GrantProtocol); never mutated or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantEntry {
    /// The capability being assigned.
    pub capability: Capability,

    /// The identity receiving it.
    pub id: IdentityId,

    /// The thread read key wrapped to the recipient. Confidential threads
    /// only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_read_key: Option<Bytes>,
}

impl GrantEntry {
    pub fn new(capability: Capability, id: impl Into<IdentityId>) -> Self {
        Self {
            capability,
            id: id.into(),
            encrypted_read_key: None,
        }
    }

    pub fn moderator(id: impl Into<IdentityId>) -> Self {
        Self::new(Capability::Moderator, id)
    }

    pub fn member(id: impl Into<IdentityId>) -> Self {
        Self::new(Capability::Member, id)
    }

    /// Attach wrapped key material.
    pub fn with_read_key(mut self, encrypted_read_key: impl Into<Bytes>) -> Self {
        self.encrypted_read_key = Some(encrypted_read_key.into());
        self
    }
}

/// Operation carried by a thread entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadOp {
    /// Post new content.
    #[serde(rename = "ADD")]
    Add,

    /// Delete an earlier entry, referenced by hash.
    #[serde(rename = "DEL")]
    Del,

    /// Any op this build does not recognize. Always denied.
    #[serde(other)]
    Unknown,
}

/// Payload of a thread-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub op: ThreadOp,

    /// Content for `ADD`; the 32-byte hash of the target entry for `DEL`.
    pub value: Bytes,
}

impl ThreadEntry {
    /// An `ADD` of `content`.
    pub fn add(content: impl Into<Bytes>) -> Self {
        Self {
            op: ThreadOp::Add,
            value: content.into(),
        }
    }

    /// A `DEL` of the entry at `target`.
    pub fn del(target: &EntryHash) -> Self {
        Self {
            op: ThreadOp::Del,
            value: Bytes::copy_from_slice(target.as_bytes()),
        }
    }

    /// The referenced entry of a `DEL`, if the value is a well-formed hash.
    pub fn target(&self) -> Option<EntryHash> {
        match self.op {
            ThreadOp::Del => EntryHash::try_from(self.value.as_ref()).ok(),
            _ => None,
        }
    }
}
