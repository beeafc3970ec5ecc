//! Identities and identity verification.
//!
//! An identity binds a string id to the key that signs log entries. The
//! access-control layer only ever looks at [`Identity::id`]; whether the
//! binding is genuine is decided by an [`IdentityVerifier`] that the caller
//! injects into every gate evaluation.
//!
//! The reference scheme ([`Ed25519IdentityVerifier`]) uses two keys:
//!
//! - a **root** key, whose public half is the id (`ed25519:<hex>`)
//! - a **signing** key, which signs log entries
//!
//! `signatures.id` is the signing key's signature over the id, and
//! `signatures.public_key` is the root key's signature over
//! `public_key || signatures.id`.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::crypto::{Ed25519PublicKey, Ed25519Signature, Keypair};
use crate::error::CoreError;
use crate::types::IdentityId;

/// Prefix of ids issued by the Ed25519 identity scheme.
pub const ED25519_ID_PREFIX: &str = "ed25519:";

/// Signatures binding an identity's signing key to its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySignatures {
    /// Signature by the signing key over the id.
    pub id: Bytes,

    /// Signature by the root key over `public_key || signatures.id`.
    pub public_key: Bytes,
}

/// A writer identity as carried on every log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The identity id.
    pub id: IdentityId,

    /// The public key that signs entries.
    pub public_key: Bytes,

    /// Binding signatures.
    pub signatures: IdentitySignatures,
}

impl Identity {
    /// Parse the entry-signing key.
    pub fn signing_key(&self) -> Result<Ed25519PublicKey, CoreError> {
        Ed25519PublicKey::from_slice(&self.public_key)
    }
}

/// The message the root key signs to bind a signing key.
fn key_binding_message(public_key: &[u8], id_signature: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(public_key.len() + id_signature.len());
    msg.extend_from_slice(public_key);
    msg.extend_from_slice(id_signature);
    msg
}

/// Secret key material for a local identity.
#[derive(Clone)]
pub struct IdentityKeys {
    signing: Keypair,
    identity: Identity,
}

impl IdentityKeys {
    /// Generate a fresh Ed25519 identity.
    pub fn generate() -> Self {
        Self::from_keypairs(Keypair::generate(), Keypair::generate())
    }

    /// Build an Ed25519 identity from deterministic seeds.
    pub fn from_seeds(root_seed: &[u8; 32], signing_seed: &[u8; 32]) -> Self {
        Self::from_keypairs(Keypair::from_seed(root_seed), Keypair::from_seed(signing_seed))
    }

    /// Build an Ed25519 identity from a root and a signing keypair.
    pub fn from_keypairs(root: Keypair, signing: Keypair) -> Self {
        let id = IdentityId::new(format!("{}{}", ED25519_ID_PREFIX, root.public_key().to_hex()));
        let identity = bind(id, &root, &signing);
        Self { signing, identity }
    }

    /// Build an identity with an arbitrary id.
    ///
    /// The id is not derived from a key, so [`Ed25519IdentityVerifier`] will
    /// reject it; such identities need a verifier that resolves ids some other
    /// way. Entry signatures still verify.
    pub fn with_id(id: impl Into<IdentityId>, signing: Keypair) -> Self {
        let identity = bind(id.into(), &signing, &signing);
        Self { signing, identity }
    }

    /// The identity id.
    pub fn id(&self) -> &IdentityId {
        &self.identity.id
    }

    /// The public identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Sign a message with the entry-signing key.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        self.signing.sign(message)
    }
}

impl std::fmt::Debug for IdentityKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityKeys({})", self.identity.id)
    }
}

fn bind(id: IdentityId, root: &Keypair, signing: &Keypair) -> Identity {
    let public_key = Bytes::copy_from_slice(signing.public_key().as_bytes());
    let id_sig = signing.sign(id.as_str().as_bytes());
    let key_sig = root.sign(&key_binding_message(&public_key, id_sig.as_bytes()));
    Identity {
        id,
        public_key,
        signatures: IdentitySignatures {
            id: Bytes::copy_from_slice(id_sig.as_bytes()),
            public_key: Bytes::copy_from_slice(key_sig.as_bytes()),
        },
    }
}

/// Decides whether an identity's signatures are genuine.
///
/// Implementations resolve `false` for invalid or malformed identities. An
/// `Err` means verification could not be carried out at all (for example a
/// remote resolver was unreachable); gates treat it as `false`.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify the identity's binding signatures.
    async fn verify(&self, identity: &Identity) -> Result<bool, CoreError>;
}

/// Run a verifier, collapsing errors into denial.
pub async fn verify_or_deny(verifier: &dyn IdentityVerifier, identity: &Identity) -> bool {
    match verifier.verify(identity).await {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!(identity = %identity.id, error = %e, "identity verification errored");
            false
        }
    }
}

/// Verifier for the Ed25519 identity scheme described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519IdentityVerifier;

impl Ed25519IdentityVerifier {
    /// Create a verifier.
    pub fn new() -> Self {
        Self
    }

    fn check(identity: &Identity) -> Result<(), CoreError> {
        let root_hex = identity
            .id
            .as_str()
            .strip_prefix(ED25519_ID_PREFIX)
            .ok_or_else(|| CoreError::MalformedIdentity("id is not an ed25519 id".into()))?;
        let root = Ed25519PublicKey::from_hex(root_hex)?;
        let signing = identity.signing_key()?;
        let id_sig = Ed25519Signature::from_slice(&identity.signatures.id)?;
        let key_sig = Ed25519Signature::from_slice(&identity.signatures.public_key)?;

        signing.verify(identity.id.as_str().as_bytes(), &id_sig)?;
        root.verify(
            &key_binding_message(&identity.public_key, &identity.signatures.id),
            &key_sig,
        )
    }
}

#[async_trait]
impl IdentityVerifier for Ed25519IdentityVerifier {
    async fn verify(&self, identity: &Identity) -> Result<bool, CoreError> {
        match Self::check(identity) {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::debug!(identity = %identity.id, reason = %e, "identity rejected");
                Ok(false)
            }
        }
    }
}
