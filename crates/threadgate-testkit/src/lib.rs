//! # Threadgate Testkit
//!
//! Testing utilities for Threadgate.
//!
//! ## Overview
//!
//! - **Fixtures**: deterministic identities and scripted identity verifiers
//! - **Generators**: proptest strategies for grants and configurations
//! - **Golden vectors**: manifest encodings every implementation must
//!   reproduce byte for byte
//!
//! ## Golden Vectors
//!
//! ```rust
//! use threadgate_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, detail) in verify_all_vectors() {
//!     assert!(ok, "{}: {}", name, detail);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use threadgate_testkit::generators::grant_sequence;
//!
//! proptest! {
//!     #[test]
//!     fn bootstrap_moderator_comes_first(grants in grant_sequence(16)) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{grant_entries, grant_snapshot, multi_party, StaticVerifier, TestIdentity};
pub use vectors::{all_vectors, verify_all_vectors, ManifestVector};
