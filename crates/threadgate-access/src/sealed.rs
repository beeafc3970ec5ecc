//! Sealed payloads: thread content encrypted with the read key.

use serde::{Deserialize, Serialize};

use threadgate_core::{decode, encode};

use crate::crypto::{EncryptionNonce, ReadKey};
use crate::error::{AccessError, Result};

/// Encryption algorithm of a sealed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SealFormat {
    ChaCha20Poly1305 = 1,
}

/// Ciphertext plus what a key holder needs to open it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload {
    pub format: SealFormat,

    /// Id of the read key used, see [`ReadKey::key_id`].
    pub key_id: String,

    pub nonce: EncryptionNonce,

    /// Includes the authentication tag.
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    pub fn seal(plaintext: &[u8], key: &ReadKey) -> Result<Self> {
        let nonce = EncryptionNonce::generate();
        let ciphertext = key.encrypt(plaintext, &nonce)?;
        Ok(Self {
            format: SealFormat::ChaCha20Poly1305,
            key_id: key.key_id(),
            nonce,
            ciphertext,
        })
    }

    pub fn open(&self, key: &ReadKey) -> Result<Vec<u8>> {
        if key.key_id() != self.key_id {
            return Err(AccessError::Decryption(format!(
                "sealed with key {}, not {}",
                self.key_id,
                key.key_id()
            )));
        }
        match self.format {
            SealFormat::ChaCha20Poly1305 => key.decrypt(&self.ciphertext, &self.nonce),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(encode(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(decode(bytes)?)
    }
}
