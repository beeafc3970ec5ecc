//! LogEntry: a signed, immutable record in an append-only log.
//!
//! Entries are generic over their payload so the same envelope carries both
//! grant assignments and thread content. Once created an entry is never
//! edited; its [`EntryHash`] is derived from its encoded bytes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::canonical::{decode, encode};
use crate::crypto::Ed25519Signature;
use crate::error::CoreError;
use crate::identity::{Identity, IdentityKeys};
use crate::types::{EntryHash, IdentityId};

/// Domain separator for entry signatures.
pub const ENTRY_DOMAIN: &[u8] = b"threadgate-entry-v0:";

/// A complete entry: author identity + payload + signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry<P> {
    /// The author.
    pub identity: Identity,

    /// Logical clock: one more than the highest clock the author's log held
    /// when the entry was created.
    pub clock: u64,

    /// Application payload.
    pub payload: P,

    /// Signature by `identity.public_key` over [`LogEntry::signed_message`].
    pub signature: Ed25519Signature,
}

/// Build the message an entry signature covers.
fn signing_message<P: Serialize>(
    author: &IdentityId,
    clock: u64,
    payload: &P,
) -> Result<Vec<u8>, CoreError> {
    let payload_bytes = encode(payload)?;
    let id = author.as_str().as_bytes();

    let mut msg = Vec::with_capacity(ENTRY_DOMAIN.len() + 16 + id.len() + payload_bytes.len());
    msg.extend_from_slice(ENTRY_DOMAIN);
    msg.extend_from_slice(&(id.len() as u64).to_be_bytes());
    msg.extend_from_slice(id);
    msg.extend_from_slice(&clock.to_be_bytes());
    msg.extend_from_slice(&payload_bytes);
    Ok(msg)
}

impl<P: Serialize> LogEntry<P> {
    /// Create and sign an entry as the given identity.
    pub fn sign(keys: &IdentityKeys, clock: u64, payload: P) -> Result<Self, CoreError> {
        let message = signing_message(keys.id(), clock, &payload)?;
        let signature = keys.sign(&message);
        Ok(Self {
            identity: keys.identity().clone(),
            clock,
            payload,
            signature,
        })
    }

    /// The message covered by the entry signature.
    pub fn signed_message(&self) -> Result<Vec<u8>, CoreError> {
        signing_message(&self.identity.id, self.clock, &self.payload)
    }

    /// Encode the entry to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        encode(self)
    }

    /// Compute the content address of this entry.
    pub fn hash(&self) -> Result<EntryHash, CoreError> {
        Ok(EntryHash::of(&self.to_bytes()?))
    }
}

impl<P: DeserializeOwned> LogEntry<P> {
    /// Decode an entry from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        decode(bytes)
    }
}

impl<P> LogEntry<P> {
    /// The author's identity id.
    pub fn author(&self) -> &IdentityId {
        &self.identity.id
    }
}
