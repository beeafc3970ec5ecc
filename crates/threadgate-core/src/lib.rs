//! # Threadgate Core
//!
//! Pure primitives for Threadgate: identities, signed log entries, and
//! content hashes.
//!
//! This crate performs no storage and no networking. The only async surface is
//! the [`IdentityVerifier`] trait, because real verifiers may need to resolve
//! keys remotely.
//!
//! ## Key Types
//!
//! - [`IdentityId`] - The string identifier of a writer
//! - [`Identity`] - An identity with its signing key and binding signatures
//! - [`LogEntry`] - A signed entry carrying an arbitrary payload
//! - [`EntryHash`] - Content address of an encoded entry (Blake3)
//!
//! ## Encoding
//!
//! Entries are encoded with CBOR via `ciborium`. See the [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod identity;
pub mod types;
pub mod validation;

pub use canonical::{decode, encode};
pub use crypto::{Ed25519PublicKey, Ed25519Signature, Keypair};
pub use entry::{LogEntry, ENTRY_DOMAIN};
pub use error::{CoreError, ValidationError};
pub use identity::{
    verify_or_deny, Ed25519IdentityVerifier, Identity, IdentityKeys, IdentitySignatures,
    IdentityVerifier, ED25519_ID_PREFIX,
};
pub use types::{EntryHash, IdentityId};
pub use validation::validate_entry;
