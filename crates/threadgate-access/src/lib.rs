//! # Threadgate Access
//!
//! Decentralized write control for a replicated thread.
//!
//! ## Overview
//!
//! Who may write to a thread is not stored as mutable flags. It is derived by
//! replaying a second append-only log, the grant log, in which moderators
//! assign capabilities. Every peer replays the same grants and arrives at the
//! same answer.
//!
//! ## Key Types
//!
//! - [`CapabilityRegistry`] - Access controller of the grant log: only
//!   moderators may grant
//! - [`CapabilityMaterializer`] - Rebuilds the [`CapabilitySet`] on every
//!   grant-log change
//! - [`WriteGate`] - Access controller of the thread log (`ADD` / `DEL`)
//! - [`GrantProtocol`] - Validates and appends grants
//! - [`RegistryManifest`], [`ThreadManifest`] - Persisted configuration
//!
//! ## Confidential Threads
//!
//! A thread with an `enc_key_id` has a symmetric [`ReadKey`]. Every grant
//! carries that key wrapped to the grantee ([`WrappedReadKey`]), and posts
//! may be [`SealedPayload`]s.
//!
//! ## Failure Model
//!
//! Authorization is fail-closed. A gate never raises: verifier errors,
//! unresolvable delete targets and unknown ops all evaluate to `false`.

pub mod capability;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gate;
pub mod keyshare;
pub mod manifest;
pub mod materializer;
pub mod payload;
pub mod protocol;
pub mod registry;
pub mod sealed;

pub use capability::{Capability, CapabilitySet};
pub use config::AccessConfig;
pub use crypto::{EncryptionNonce, ReadKey, X25519PublicKey, X25519StaticSecret};
pub use error::{AccessError, ConfidentialityError, GrantDenial, Result};
pub use gate::{WriteGate, THREAD_ACCESS};
pub use keyshare::WrappedReadKey;
pub use manifest::{
    decode_address, encode_address, RegistryManifest, ThreadManifest, MANIFEST_VERSION,
};
pub use materializer::{materialize, CapabilityMaterializer};
pub use payload::{GrantEntry, ThreadEntry, ThreadOp};
pub use protocol::GrantProtocol;
pub use registry::{CapabilityRegistry, MODERATOR_ACCESS};
pub use sealed::{SealFormat, SealedPayload};
