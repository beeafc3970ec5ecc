//! Test fixtures and helpers.

use std::sync::Arc;

use async_trait::async_trait;

use threadgate_access::{GrantEntry, X25519PublicKey, X25519StaticSecret};
use threadgate_core::{
    CoreError, EntryHash, Identity, IdentityId, IdentityKeys, IdentityVerifier, Keypair, LogEntry,
};
use threadgate_store::LogSnapshot;

/// A deterministic identity with an X25519 secret for read-key exchange.
pub struct TestIdentity {
    pub keys: IdentityKeys,
    pub exchange: X25519StaticSecret,
}

impl TestIdentity {
    /// An Ed25519 identity (`ed25519:<hex>` id) derived from `seed`.
    ///
    /// Passes [`Ed25519IdentityVerifier`](threadgate_core::Ed25519IdentityVerifier).
    pub fn from_seed(seed: u8) -> Self {
        Self {
            keys: IdentityKeys::from_seeds(&[seed; 32], &[seed ^ 0xff; 32]),
            exchange: X25519StaticSecret::from_bytes([seed.wrapping_add(0x80); 32]),
        }
    }

    /// An identity with a readable id such as `"m1"` or `"alice"`.
    ///
    /// Only a scripted verifier accepts it.
    pub fn named(id: &str) -> Self {
        let seed = *EntryHash::of(id.as_bytes()).as_bytes();
        Self {
            keys: IdentityKeys::with_id(id, Keypair::from_seed(&seed)),
            exchange: X25519StaticSecret::from_bytes(seed),
        }
    }

    pub fn id(&self) -> &IdentityId {
        self.keys.id()
    }

    pub fn exchange_public(&self) -> X25519PublicKey {
        self.exchange.public_key()
    }
}

/// Create several Ed25519 identities with distinct seeds.
pub fn multi_party(count: usize) -> Vec<TestIdentity> {
    (0..count).map(|i| TestIdentity::from_seed(i as u8 + 1)).collect()
}

/// An identity verifier with a fixed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticVerifier {
    /// Every identity verifies.
    Approve,
    /// No identity verifies.
    Deny,
    /// Verification cannot be carried out.
    Fail,
}

impl StaticVerifier {
    pub fn shared(self) -> Arc<dyn IdentityVerifier> {
        Arc::new(self)
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, _identity: &Identity) -> Result<bool, CoreError> {
        match self {
            StaticVerifier::Approve => Ok(true),
            StaticVerifier::Deny => Ok(false),
            StaticVerifier::Fail => Err(CoreError::Resolution("verifier unavailable".into())),
        }
    }
}

/// Sign `grants` as `author` with consecutive clocks.
pub fn grant_entries(author: &IdentityKeys, grants: Vec<GrantEntry>) -> Vec<LogEntry<GrantEntry>> {
    grants
        .into_iter()
        .zip(1u64..)
        .filter_map(|(grant, clock)| LogEntry::sign(author, clock, grant).ok())
        .collect()
}

/// A grant-log snapshot holding `grants` signed by `author`.
pub fn grant_snapshot(author: &IdentityKeys, grants: Vec<GrantEntry>) -> LogSnapshot<GrantEntry> {
    LogSnapshot::new(Arc::new(grant_entries(author, grants)))
}
