//! # Threadgate
//!
//! Moderated threads over replicated append-only logs.
//!
//! ## Overview
//!
//! A [`Thread`] is two logs:
//!
//! - **Content log**: `ADD` and `DEL` entries, gated by the write gate
//! - **Grant log**: capability assignments, gated by the capability registry
//!
//! Nobody holds a mutable permission table. Every peer replays the grant log
//! and derives the same set of moderators and members, and every peer
//! independently decides whether an incoming entry is allowed.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use threadgate::{Thread, ThreadConfig};
//! use threadgate::access::AccessConfig;
//! use threadgate::core::{Ed25519IdentityVerifier, IdentityKeys};
//!
//! async fn example() -> threadgate::Result<()> {
//!     let keys = IdentityKeys::generate();
//!     let access = AccessConfig::new(keys.id().clone()).with_members_only(true);
//!
//!     let thread = Thread::create(
//!         ThreadConfig::new("general", access),
//!         keys,
//!         Arc::new(Ed25519IdentityVerifier::new()),
//!     )
//!     .await?;
//!
//!     thread.add_member("ed25519:...").await?;
//!     thread.post(&b"hello"[..]).await?;
//!
//!     // Anyone with the manifest can open the same thread.
//!     let manifest = thread.manifest().to_json()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `threadgate::core` - Identities, signed entries, hashes
//! - `threadgate::store` - Log and content store interfaces
//! - `threadgate::access` - Registry, materializer, gate, grants, manifests

pub mod config;
pub mod error;
pub mod thread;

pub use threadgate_access as access;
pub use threadgate_core as core;
pub use threadgate_store as store;

pub use config::ThreadConfig;
pub use error::{Result, ThreadError};
pub use thread::{Post, SyncReport, Thread};

pub use threadgate_access::{
    AccessConfig, Capability, CapabilitySet, GrantDenial, ReadKey, ThreadManifest,
    X25519PublicKey, X25519StaticSecret,
};
pub use threadgate_core::{Ed25519IdentityVerifier, EntryHash, IdentityId, IdentityKeys};
