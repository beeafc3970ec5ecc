//! Golden manifest vectors.
//!
//! The compact registry address and the registry manifest JSON are the only
//! persisted forms of an access configuration. These vectors pin both.

use threadgate_access::{AccessConfig, RegistryManifest};

/// A golden manifest vector.
#[derive(Debug, Clone)]
pub struct ManifestVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub first_moderator: &'static str,
    pub members_only: bool,
    pub enc_key_id: Option<&'static str>,
    /// Expected compact registry address.
    pub expected_address: &'static str,
    /// Expected registry manifest JSON.
    pub expected_json: &'static str,
}

impl ManifestVector {
    pub fn config(&self) -> AccessConfig {
        AccessConfig {
            first_moderator: self.first_moderator.into(),
            members_only: self.members_only,
            enc_key_id: self.enc_key_id.map(String::from),
        }
    }
}

/// Get all golden manifest vectors.
pub fn all_vectors() -> Vec<ManifestVector> {
    vec![
        ManifestVector {
            name: "open thread",
            first_moderator: "m1",
            members_only: false,
            enc_key_id: None,
            expected_address: "moderator-access/mod_m1",
            expected_json: r#"{"version":1,"address":"moderator-access/mod_m1"}"#,
        },
        ManifestVector {
            name: "member-gated thread",
            first_moderator: "m1",
            members_only: true,
            enc_key_id: None,
            expected_address: "moderator-access/mod_m1/members",
            expected_json: r#"{"version":1,"address":"moderator-access/mod_m1/members"}"#,
        },
        ManifestVector {
            name: "confidential member-gated thread",
            first_moderator: "did:3:bafyreia",
            members_only: true,
            enc_key_id: Some("k1"),
            expected_address: "moderator-access/mod_did:3:bafyreia/members",
            expected_json: r#"{"version":1,"address":"moderator-access/mod_did:3:bafyreia/members","encKeyId":"k1"}"#,
        },
        ManifestVector {
            name: "ed25519 moderator, open, confidential",
            first_moderator: "ed25519:00ff",
            members_only: false,
            enc_key_id: Some("0123456789abcdef0123456789abcdef"),
            expected_address: "moderator-access/mod_ed25519:00ff",
            expected_json: r#"{"version":1,"address":"moderator-access/mod_ed25519:00ff","encKeyId":"0123456789abcdef0123456789abcdef"}"#,
        },
    ]
}

/// Encode every vector and compare with the expected forms.
///
/// Returns `(name, matches, detail)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let result = RegistryManifest::encode(&v.config()).and_then(|manifest| {
                let json = serde_json::to_string(&manifest)
                    .map_err(|e| threadgate_access::AccessError::Manifest(e.to_string()))?;
                Ok((manifest, json))
            });
            match result {
                Ok((manifest, json)) => {
                    let matches = manifest.address == v.expected_address && json == v.expected_json;
                    (v.name.to_string(), matches, json)
                }
                Err(e) => (v.name.to_string(), false, e.to_string()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, detail) in verify_all_vectors() {
            assert!(matches, "vector '{}' produced {}", name, detail);
        }
    }

    #[test]
    fn test_vectors_decode_exactly() {
        for vector in all_vectors() {
            let manifest: RegistryManifest = serde_json::from_str(vector.expected_json).unwrap();
            assert_eq!(
                manifest.decode().unwrap(),
                vector.config(),
                "vector '{}' decoded differently",
                vector.name
            );
        }
    }
}
