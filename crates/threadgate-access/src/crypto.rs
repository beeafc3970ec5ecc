//! Key agreement and symmetric encryption for confidential threads.
//!
//! X25519 for wrapping the thread read key to each grantee, ChaCha20-Poly1305
//! for the wrap itself and for sealed posts.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::error::{AccessError, Result};

const WRAP_KEY_CONTEXT: &str = "threadgate-access-v0 read-key wrap";
const KEY_ID_CONTEXT: &str = "threadgate-access-v0 read-key id";

/// Length of a read key id in hex characters.
const KEY_ID_LEN: usize = 32;

fn random<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// A grantee's X25519 public key, as handed to the moderator granting access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct X25519PublicKey(pub [u8; 32]);

impl From<&X25519PublicKey> for PublicKey {
    fn from(key: &X25519PublicKey) -> Self {
        PublicKey::from(key.0)
    }
}

impl From<PublicKey> for X25519PublicKey {
    fn from(key: PublicKey) -> Self {
        Self(key.to_bytes())
    }
}

/// A grantee's long-lived X25519 secret.
pub struct X25519StaticSecret(StaticSecret);

impl X25519StaticSecret {
    pub fn generate() -> Self {
        Self::from_bytes(random())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    pub fn public_key(&self) -> X25519PublicKey {
        PublicKey::from(&self.0).into()
    }

    pub fn diffie_hellman(&self, sender: &X25519PublicKey) -> SharedKey {
        SharedKey(self.0.diffie_hellman(&sender.into()).to_bytes())
    }
}

/// Output of one X25519 agreement. Never used as a key directly.
pub struct SharedKey([u8; 32]);

impl SharedKey {
    /// The key that wraps a read key for the recipient named by `context`.
    pub fn derive_wrap_key(&self, context: &[u8]) -> ReadKey {
        let mut hasher = blake3::Hasher::new_derive_key(WRAP_KEY_CONTEXT);
        hasher.update(&self.0);
        hasher.update(context);
        ReadKey(*hasher.finalize().as_bytes())
    }
}

/// Sender side of a one-shot key agreement.
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
    public: X25519PublicKey,
}

impl EphemeralKeyPair {
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(rand::thread_rng());
        let public = PublicKey::from(&secret).into();
        Self { secret, public }
    }

    pub fn public_key(&self) -> X25519PublicKey {
        self.public
    }

    pub fn diffie_hellman(self, recipient: &X25519PublicKey) -> SharedKey {
        SharedKey(self.secret.diffie_hellman(&recipient.into()).to_bytes())
    }
}

/// The symmetric key of a confidential thread.
///
/// Every grantee of the thread holds the same read key. Only its
/// [`key_id`](Self::key_id) is public.
#[derive(Clone, PartialEq, Eq)]
pub struct ReadKey([u8; 32]);

impl ReadKey {
    pub fn generate() -> Self {
        Self(random())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Public identifier of the key, recorded as the thread's `encKeyId`.
    pub fn key_id(&self) -> String {
        let mut hasher = blake3::Hasher::new_derive_key(KEY_ID_CONTEXT);
        hasher.update(&self.0);
        hasher.finalize().to_hex().as_str()[..KEY_ID_LEN].to_string()
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }

    pub fn encrypt(&self, plaintext: &[u8], nonce: &EncryptionNonce) -> Result<Vec<u8>> {
        self.cipher()
            .encrypt(Nonce::from_slice(&nonce.0), plaintext)
            .map_err(|e| AccessError::Encryption(e.to_string()))
    }

    /// Fails with [`AccessError::Decryption`] on a wrong key or tampered input.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &EncryptionNonce) -> Result<Vec<u8>> {
        self.cipher()
            .decrypt(Nonce::from_slice(&nonce.0), ciphertext)
            .map_err(|e| AccessError::Decryption(e.to_string()))
    }
}

impl std::fmt::Debug for ReadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReadKey({})", self.key_id())
    }
}

/// A random 96-bit ChaCha20-Poly1305 nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionNonce(pub [u8; 12]);

impl EncryptionNonce {
    pub fn generate() -> Self {
        Self(random())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grantee_and_sender_agree() {
        let grantee = X25519StaticSecret::generate();
        let sender = EphemeralKeyPair::generate();
        let sender_public = sender.public_key();

        let sent = sender.diffie_hellman(&grantee.public_key());
        let received = grantee.diffie_hellman(&sender_public);
        assert_eq!(sent.0, received.0);
    }

    #[test]
    fn test_read_key_encrypts_posts() {
        let key = ReadKey::generate();
        let nonce = EncryptionNonce::generate();

        let ciphertext = key.encrypt(b"minutes", &nonce).unwrap();
        assert_ne!(ciphertext.as_slice(), b"minutes");
        assert_eq!(key.decrypt(&ciphertext, &nonce).unwrap(), b"minutes");

        assert!(matches!(
            ReadKey::generate().decrypt(&ciphertext, &nonce),
            Err(AccessError::Decryption(_))
        ));
    }

    #[test]
    fn test_key_id_is_stable_and_distinct() {
        let key = ReadKey::from_bytes([7; 32]);
        assert_eq!(key.key_id(), ReadKey::from_bytes([7; 32]).key_id());
        assert_ne!(key.key_id(), ReadKey::from_bytes([8; 32]).key_id());
        assert_eq!(key.key_id().len(), KEY_ID_LEN);
    }

    #[test]
    fn test_wrap_key_depends_on_recipient() {
        let shared = SharedKey([0x42; 32]);
        assert_ne!(
            shared.derive_wrap_key(b"alice"),
            shared.derive_wrap_key(b"bob")
        );
    }
}
