//! Proptest generators for property-based testing.

use proptest::prelude::*;

use threadgate_access::{AccessConfig, Capability, GrantEntry};
use threadgate_core::IdentityId;

/// An identity id from a small pool, so that generated grants collide.
pub fn identity_id() -> impl Strategy<Value = IdentityId> {
    (0u8..8).prop_map(|n| IdentityId::new(format!("id{}", n)))
}

/// An identity id that can appear in a registry address.
pub fn encodable_identity_id() -> impl Strategy<Value = IdentityId> {
    "[a-z][a-z0-9:._-]{0,47}".prop_map(IdentityId::new)
}

pub fn capability() -> impl Strategy<Value = Capability> {
    prop_oneof![Just(Capability::Moderator), Just(Capability::Member)]
}

/// A grant without key material.
pub fn grant_entry() -> impl Strategy<Value = GrantEntry> {
    (capability(), identity_id()).prop_map(|(capability, id)| GrantEntry::new(capability, id))
}

/// Up to `max_len` grants.
pub fn grant_sequence(max_len: usize) -> impl Strategy<Value = Vec<GrantEntry>> {
    prop::collection::vec(grant_entry(), 0..=max_len)
}

/// Generate a valid access configuration.
pub fn access_config() -> impl Strategy<Value = AccessConfig> {
    (
        encodable_identity_id(),
        any::<bool>(),
        proptest::option::of("[0-9a-f]{32}"),
    )
        .prop_map(|(first_moderator, members_only, enc_key_id)| AccessConfig {
            first_moderator,
            members_only,
            enc_key_id,
        })
}
