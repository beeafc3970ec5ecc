//! Wrapping the thread read key for a grantee.
//!
//! A moderator granting access to a confidential thread wraps the read key
//! to the grantee's X25519 public key and puts the result in the grant's
//! `encryptedReadKey`. The wrap key is bound to the grantee's identity id, so
//! a blob copied into a grant for someone else does not unwrap.

use serde::{Deserialize, Serialize};

use threadgate_core::{decode, encode, IdentityId};

use crate::crypto::{
    EncryptionNonce, EphemeralKeyPair, ReadKey, X25519PublicKey, X25519StaticSecret,
};
use crate::error::{AccessError, Result};

/// A read key encrypted to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedReadKey {
    /// Sender's side of the key agreement.
    pub ephemeral_public: X25519PublicKey,

    pub nonce: EncryptionNonce,

    /// The read key, encrypted with the derived wrap key.
    pub ciphertext: Vec<u8>,
}

impl WrappedReadKey {
    /// Wrap `read_key` for `recipient` (identity id) holding `recipient_public`.
    pub fn wrap(
        read_key: &ReadKey,
        recipient: &IdentityId,
        recipient_public: &X25519PublicKey,
    ) -> Result<Self> {
        let ephemeral = EphemeralKeyPair::generate();
        let ephemeral_public = ephemeral.public_key();

        let wrap_key = ephemeral
            .diffie_hellman(recipient_public)
            .derive_wrap_key(recipient.as_str().as_bytes());

        let nonce = EncryptionNonce::generate();
        let ciphertext = wrap_key.encrypt(read_key.as_bytes(), &nonce)?;

        Ok(Self {
            ephemeral_public,
            nonce,
            ciphertext,
        })
    }

    /// Recover the read key as `recipient`.
    pub fn unwrap_key(
        &self,
        recipient: &IdentityId,
        recipient_secret: &X25519StaticSecret,
    ) -> Result<ReadKey> {
        let wrap_key = recipient_secret
            .diffie_hellman(&self.ephemeral_public)
            .derive_wrap_key(recipient.as_str().as_bytes());

        let key_bytes = wrap_key.decrypt(&self.ciphertext, &self.nonce)?;
        let bytes: [u8; 32] = key_bytes.as_slice().try_into().map_err(|_| {
            AccessError::Decryption(format!(
                "invalid key length: expected 32, got {}",
                key_bytes.len()
            ))
        })?;
        Ok(ReadKey::from_bytes(bytes))
    }

    /// Encode for the grant entry.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(encode(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(decode(bytes)?)
    }
}
