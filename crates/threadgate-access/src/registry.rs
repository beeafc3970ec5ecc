//! The capability registry: access controller of the grant log.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use threadgate_core::{verify_or_deny, IdentityId, IdentityVerifier, LogEntry};
use threadgate_store::AccessController;

use crate::capability::Capability;
use crate::config::AccessConfig;
use crate::error::Result;
use crate::manifest::RegistryManifest;
use crate::payload::GrantEntry;

/// Type tag of the registry in log and manifest addresses.
pub const MODERATOR_ACCESS: &str = "moderator-access";

const OPEN_CAPABILITIES: &[Capability] = &[Capability::Moderator];
const MEMBER_CAPABILITIES: &[Capability] = &[Capability::Moderator, Capability::Member];

/// Decides who may append to the grant log.
///
/// Only moderators may grant. The registry keeps its own moderator list,
/// seeded with the bootstrap moderator and extended as MODERATOR grants are
/// accepted, so that a grant can be authorized before any rebuild of the
/// materialized set has run.
#[derive(Debug)]
pub struct CapabilityRegistry {
    config: AccessConfig,
    valid_capabilities: &'static [Capability],
    moderators: RwLock<Vec<IdentityId>>,
}

impl CapabilityRegistry {
    /// Create a registry. Fails with [`AccessError::Config`](crate::AccessError::Config)
    /// if the bootstrap moderator is missing.
    pub fn new(config: AccessConfig) -> Result<Self> {
        config.validate()?;
        let valid_capabilities = if config.members_only {
            MEMBER_CAPABILITIES
        } else {
            OPEN_CAPABILITIES
        };
        let moderators = RwLock::new(vec![config.first_moderator.clone()]);
        Ok(Self {
            config,
            valid_capabilities,
            moderators,
        })
    }

    /// Recreate a registry from its manifest.
    pub fn from_manifest(manifest: &RegistryManifest) -> Result<Self> {
        Self::new(manifest.decode()?)
    }

    /// The persisted form of this registry.
    pub fn manifest(&self) -> Result<RegistryManifest> {
        RegistryManifest::encode(&self.config)
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    pub fn first_moderator(&self) -> &IdentityId {
        &self.config.first_moderator
    }

    pub fn members_only(&self) -> bool {
        self.config.members_only
    }

    pub fn enc_key_id(&self) -> Option<&str> {
        self.config.enc_key_id.as_deref()
    }

    /// Capabilities that may be granted on this thread.
    pub fn valid_capabilities(&self) -> &'static [Capability] {
        self.valid_capabilities
    }

    pub fn is_valid_capability(&self, capability: Capability) -> bool {
        self.valid_capabilities.contains(&capability)
    }

    pub fn is_moderator(&self, id: &str) -> bool {
        self.moderators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|m| m == id)
    }

    /// Moderators known to the registry, bootstrap first.
    pub fn moderators(&self) -> Vec<IdentityId> {
        self.moderators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn moderator_count(&self) -> usize {
        self.moderators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn insert_moderator(&self, id: &IdentityId) {
        let mut moderators = self.moderators.write().unwrap_or_else(PoisonError::into_inner);
        if !moderators.contains(id) {
            moderators.push(id.clone());
        }
    }
}

#[async_trait]
impl AccessController<GrantEntry> for CapabilityRegistry {
    fn type_tag(&self) -> &str {
        MODERATOR_ACCESS
    }

    async fn can_append(
        &self,
        entry: &LogEntry<GrantEntry>,
        verifier: &dyn IdentityVerifier,
    ) -> bool {
        let author = entry.author();
        let grant = &entry.payload;

        if !self.is_moderator(author.as_str()) {
            tracing::debug!(%author, target_id = %grant.id, "grant denied: author is not a moderator");
            return false;
        }

        if !self.is_valid_capability(grant.capability) {
            tracing::debug!(%author, capability = %grant.capability, "grant denied: invalid capability");
            return false;
        }

        if !verify_or_deny(verifier, &entry.identity).await {
            tracing::debug!(%author, "grant denied: identity verification failed");
            return false;
        }

        true
    }

    async fn on_accepted(&self, entry: &LogEntry<GrantEntry>) {
        if entry.payload.capability == Capability::Moderator {
            self.insert_moderator(&entry.payload.id);
        }
    }
}
