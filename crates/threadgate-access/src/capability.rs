//! Capabilities and the materialized capability set.

use std::fmt;

use serde::{Deserialize, Serialize};

use threadgate_core::IdentityId;

/// A right that can be assigned through the grant log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// May grant capabilities and delete any entry.
    #[serde(rename = "MODERATOR")]
    Moderator,

    /// May write to a member-gated thread.
    #[serde(rename = "MEMBER")]
    Member,
}

impl Capability {
    /// Wire name of the capability.
    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::Moderator => "MODERATOR",
            Capability::Member => "MEMBER",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities derived by replaying a grant log.
///
/// Never mutated after construction; a rebuild produces a new set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    moderators: Vec<IdentityId>,
    members: Vec<IdentityId>,
    source_len: usize,
}

impl CapabilitySet {
    /// The set before any grant is replayed: the bootstrap moderator only.
    pub fn bootstrap(first_moderator: IdentityId) -> Self {
        Self {
            moderators: vec![first_moderator],
            members: Vec::new(),
            source_len: 0,
        }
    }

    /// Moderators in grant order, bootstrap first.
    pub fn moderators(&self) -> &[IdentityId] {
        &self.moderators
    }

    /// Members in grant order.
    pub fn members(&self) -> &[IdentityId] {
        &self.members
    }

    /// Holders of `capability`.
    pub fn holders(&self, capability: Capability) -> &[IdentityId] {
        match capability {
            Capability::Moderator => &self.moderators,
            Capability::Member => &self.members,
        }
    }

    /// Number of grant-log entries this set was built from.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn is_moderator(&self, id: &str) -> bool {
        self.moderators.iter().any(|m| m == id)
    }

    pub fn is_member(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }

    /// Whether `id` may write to a member-gated thread.
    pub fn may_write(&self, id: &str) -> bool {
        self.is_member(id) || self.is_moderator(id)
    }

    pub(crate) fn insert(&mut self, capability: Capability, id: &IdentityId) {
        let holders = match capability {
            Capability::Moderator => &mut self.moderators,
            Capability::Member => &mut self.members,
        };
        if !holders.contains(id) {
            holders.push(id.clone());
        }
    }

    pub(crate) fn set_source_len(&mut self, len: usize) {
        self.source_len = len;
    }
}
