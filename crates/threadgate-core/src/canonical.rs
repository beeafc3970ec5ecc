//! CBOR encoding for entries and payloads.
//!
//! Entry payloads are plain serde structs with a fixed field order and no
//! unordered maps, so `ciborium`'s output is deterministic for them. The same
//! entry therefore produces identical bytes (and an identical [`EntryHash`])
//! on every peer.
//!
//! [`EntryHash`]: crate::types::EntryHash

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;

/// Encode a value to CBOR bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

/// Decode a value from CBOR bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}
