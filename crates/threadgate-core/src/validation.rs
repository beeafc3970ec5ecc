//! Entry validation: signature verification and structural checks.

use serde::Serialize;

use crate::entry::LogEntry;
use crate::error::ValidationError;

/// Validate an entry's own signature.
///
/// This checks that `identity.public_key` signed the entry. It does not say
/// whether the identity itself is genuine; that is the job of an
/// [`IdentityVerifier`](crate::identity::IdentityVerifier) inside the access
/// controller.
pub fn validate_entry<P: Serialize>(entry: &LogEntry<P>) -> Result<(), ValidationError> {
    if entry.identity.id.is_empty() {
        return Err(ValidationError::StructuralError(
            "entry author id is empty".into(),
        ));
    }

    let key = entry
        .identity
        .signing_key()
        .map_err(|_| ValidationError::MalformedPublicKey)?;

    let message = entry.signed_message()?;
    key.verify(&message, &entry.signature)
        .map_err(|_| ValidationError::SignatureFailed)
}
