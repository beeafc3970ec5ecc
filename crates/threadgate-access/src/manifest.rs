//! Manifests: the persisted form of an access configuration.
//!
//! The registry is identified by a compact address string
//!
//! ```text
//! moderator-access/mod_<firstModerator>[/members]
//! ```
//!
//! optionally preceded by a log-address prefix, plus an optional encryption
//! key id. A thread manifest bundles the content log address with the access
//! configuration and is stored as JSON.

use serde::{Deserialize, Serialize};

use threadgate_core::IdentityId;
use threadgate_store::LogAddress;

use crate::config::AccessConfig;
use crate::error::{AccessError, Result};
use crate::registry::MODERATOR_ACCESS;

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

const MODERATOR_PREFIX: &str = "mod_";
const MEMBERS_FLAG: &str = "members";

/// Build the compact registry address.
pub fn encode_address(first_moderator: &IdentityId, members_only: bool) -> Result<String> {
    if first_moderator.is_empty() {
        return Err(AccessError::Config(
            "a bootstrap moderator id is required".into(),
        ));
    }
    if first_moderator.as_str().contains('/') {
        return Err(AccessError::Manifest(format!(
            "moderator id {} contains '/'",
            first_moderator
        )));
    }

    let mut address = format!(
        "{}/{}{}",
        MODERATOR_ACCESS, MODERATOR_PREFIX, first_moderator
    );
    if members_only {
        address.push('/');
        address.push_str(MEMBERS_FLAG);
    }
    Ok(address)
}

/// Parse a compact registry address into `(first_moderator, members_only)`.
pub fn decode_address(address: &str) -> Result<(IdentityId, bool)> {
    let mut segments: Vec<&str> = address.trim_end_matches('/').split('/').collect();

    let members_only = segments.last() == Some(&MEMBERS_FLAG);
    if members_only {
        segments.pop();
    }

    let moderator = segments
        .pop()
        .and_then(|s| s.strip_prefix(MODERATOR_PREFIX))
        .ok_or_else(|| AccessError::Manifest(format!("no moderator segment in {}", address)))?;
    if segments.pop() != Some(MODERATOR_ACCESS) {
        return Err(AccessError::Manifest(format!(
            "not a {} address: {}",
            MODERATOR_ACCESS, address
        )));
    }
    if moderator.is_empty() {
        return Err(AccessError::Config(
            "a bootstrap moderator id is required".into(),
        ));
    }

    Ok((IdentityId::new(moderator), members_only))
}

/// Persisted form of a [`CapabilityRegistry`](crate::CapabilityRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryManifest {
    pub version: u32,

    /// Compact address, see [`encode_address`].
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc_key_id: Option<String>,
}

impl RegistryManifest {
    /// Encode an access configuration.
    pub fn encode(config: &AccessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            version: MANIFEST_VERSION,
            address: encode_address(&config.first_moderator, config.members_only)?,
            enc_key_id: config.enc_key_id.clone(),
        })
    }

    /// Recover the access configuration. Exact inverse of [`encode`](Self::encode).
    pub fn decode(&self) -> Result<AccessConfig> {
        check_version(self.version)?;
        let (first_moderator, members_only) = decode_address(&self.address)?;
        let config = AccessConfig {
            first_moderator,
            members_only,
            enc_key_id: self.enc_key_id.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Persisted form of a thread: where its content lives and who governs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadManifest {
    pub version: u32,

    /// Address of the content log. Opaque to the access layer.
    pub address: LogAddress,

    pub first_moderator: IdentityId,

    pub members_only: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc_key_id: Option<String>,
}

impl ThreadManifest {
    pub fn new(address: LogAddress, config: &AccessConfig) -> Self {
        Self {
            version: MANIFEST_VERSION,
            address,
            first_moderator: config.first_moderator.clone(),
            members_only: config.members_only,
            enc_key_id: config.enc_key_id.clone(),
        }
    }

    /// The access configuration recorded in this manifest.
    pub fn access_config(&self) -> Result<AccessConfig> {
        check_version(self.version)?;
        let config = AccessConfig {
            first_moderator: self.first_moderator.clone(),
            members_only: self.members_only,
            enc_key_id: self.enc_key_id.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AccessError::Manifest(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self =
            serde_json::from_str(json).map_err(|e| AccessError::Manifest(e.to_string()))?;
        check_version(manifest.version)?;
        Ok(manifest)
    }
}

fn check_version(version: u32) -> Result<()> {
    if version != MANIFEST_VERSION {
        return Err(AccessError::Manifest(format!(
            "unsupported manifest version {}",
            version
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_address_forms() {
        assert_eq!(
            encode_address(&"m1".into(), false).unwrap(),
            "moderator-access/mod_m1"
        );
        assert_eq!(
            encode_address(&"m1".into(), true).unwrap(),
            "moderator-access/mod_m1/members"
        );
    }

    #[test]
    fn test_registry_manifest_roundtrip() {
        let configs = [
            AccessConfig::new("m1"),
            AccessConfig::new("m1").with_members_only(true),
            AccessConfig::new("ed25519:abcd")
                .with_members_only(true)
                .with_enc_key_id("k1"),
        ];
        for config in configs {
            let manifest = RegistryManifest::encode(&config).unwrap();
            assert_eq!(manifest.decode().unwrap(), config);
        }
    }

    #[test]
    fn test_decode_tolerates_address_prefix() {
        let (id, members_only) =
            decode_address("/memlog/abcdef/moderator-access/mod_m1/members").unwrap();
        assert_eq!(id, "m1");
        assert!(members_only);
    }

    #[test]
    fn test_decode_rejects_foreign_addresses() {
        assert!(matches!(
            decode_address("other-access/mod_m1"),
            Err(AccessError::Manifest(_))
        ));
        assert!(matches!(
            decode_address("moderator-access/m1"),
            Err(AccessError::Manifest(_))
        ));
        assert!(matches!(
            decode_address("moderator-access/mod_"),
            Err(AccessError::Config(_))
        ));
    }

    #[test]
    fn test_slash_in_id_is_rejected() {
        assert!(matches!(
            encode_address(&"did/x".into(), false),
            Err(AccessError::Manifest(_))
        ));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let manifest = RegistryManifest {
            version: 7,
            address: "moderator-access/mod_m1".into(),
            enc_key_id: None,
        };
        assert!(matches!(manifest.decode(), Err(AccessError::Manifest(_))));
    }

    #[test]
    fn test_thread_manifest_json() {
        let address = LogAddress::derive("general", "thread-access");
        let config = AccessConfig::new("m1").with_enc_key_id("k1");
        let manifest = ThreadManifest::new(address.clone(), &config);

        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"firstModerator\":\"m1\""));

        let parsed = ThreadManifest::from_json(&json).unwrap();
        assert_eq!(parsed.address, address);
        assert_eq!(parsed.access_config().unwrap(), config);
    }
}
