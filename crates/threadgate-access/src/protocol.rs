//! The grant protocol: the only way capabilities are assigned.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;

use threadgate_core::{EntryHash, IdentityId};
use threadgate_store::LogStore;

use crate::capability::Capability;
use crate::error::{AccessError, ConfidentialityError, GrantDenial, Result};
use crate::materializer::CapabilityMaterializer;
use crate::payload::GrantEntry;
use crate::registry::CapabilityRegistry;

/// Validates and appends grant entries, and looks up wrapped read keys.
///
/// Pre-checks run against the materialized capability set; the final word
/// belongs to the grant log's access controller. A refusal there surfaces as
/// [`GrantDenial::Refused`], any other store failure propagates unchanged.
///
/// Grants issued through one protocol are serialized, so a duplicate check
/// always sees every grant issued before it.
pub struct GrantProtocol {
    registry: Arc<CapabilityRegistry>,
    capabilities: Arc<CapabilityMaterializer>,
    log: Arc<dyn LogStore<GrantEntry>>,
    issuing: Mutex<()>,
}

impl GrantProtocol {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        capabilities: Arc<CapabilityMaterializer>,
        log: Arc<dyn LogStore<GrantEntry>>,
    ) -> Self {
        Self {
            registry,
            capabilities,
            log,
            issuing: Mutex::new(()),
        }
    }

    /// Whether grants must carry a wrapped read key.
    pub fn is_confidential(&self) -> bool {
        self.registry.enc_key_id().is_some()
    }

    /// Grant `capability` to `id`, returning the hash of the grant entry.
    pub async fn grant(
        &self,
        capability: Capability,
        id: impl Into<IdentityId>,
        encrypted_read_key: Option<Bytes>,
    ) -> Result<EntryHash> {
        let id = id.into();
        let _issuing = self.issuing.lock().await;

        if let Some(reason) = self.precheck(capability, &id, encrypted_read_key.is_some()) {
            tracing::debug!(%capability, %id, %reason, "grant refused");
            return Err(AccessError::GrantDenied {
                capability,
                id,
                reason,
            });
        }

        let entry = GrantEntry {
            capability,
            id: id.clone(),
            encrypted_read_key,
        };
        match self.log.append(entry).await {
            Ok(hash) => {
                tracing::debug!(%capability, %id, %hash, "capability granted");
                Ok(hash)
            }
            Err(e) if e.is_access_denied() => {
                tracing::debug!(%capability, %id, "grant refused by grant log");
                Err(AccessError::GrantDenied {
                    capability,
                    id,
                    reason: GrantDenial::Refused,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn precheck(&self, capability: Capability, id: &IdentityId, has_key: bool) -> Option<GrantDenial> {
        if !self.registry.is_valid_capability(capability) {
            return Some(GrantDenial::InvalidCapability);
        }

        let current = self.capabilities.current();
        let duplicate = match capability {
            Capability::Member => current.is_member(id.as_str()),
            // The bootstrap moderator may re-grant itself while alone, to
            // record its own wrapped read key.
            Capability::Moderator => {
                current.is_moderator(id.as_str()) && self.registry.moderator_count() != 1
            }
        };
        if duplicate {
            return Some(GrantDenial::AlreadyGranted);
        }

        if self.is_confidential() && !has_key {
            return Some(GrantDenial::MissingReadKey);
        }
        None
    }

    /// The wrapped read key granted to `id`.
    pub async fn encrypted_key(&self, id: &IdentityId) -> Result<Bytes> {
        if !self.is_confidential() {
            return Err(ConfidentialityError::NotConfidential.into());
        }

        self.log
            .snapshot()
            .await
            .iter()
            .filter(|entry| &entry.payload.id == id)
            .find_map(|entry| entry.payload.encrypted_read_key.clone())
            .ok_or_else(|| ConfidentialityError::NoGrant(id.clone()).into())
    }
}
