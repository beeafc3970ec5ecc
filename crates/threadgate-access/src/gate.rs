//! The write gate: access controller of the thread log.

use std::sync::Arc;

use async_trait::async_trait;

use threadgate_core::{verify_or_deny, EntryHash, IdentityId, IdentityVerifier, LogEntry};
use threadgate_store::{AccessController, ContentStore};

use crate::materializer::CapabilityMaterializer;
use crate::payload::{ThreadEntry, ThreadOp};

/// Type tag of the gate in log addresses.
pub const THREAD_ACCESS: &str = "thread-access";

/// Decides who may append to a thread.
///
/// - `ADD`: anyone on an open thread; members and moderators on a
///   member-gated thread.
/// - `DEL`: the author of the referenced entry, or any moderator. The target
///   must resolve through the content store.
/// - anything else: denied.
///
/// Every allowed branch additionally requires the author's identity to
/// verify. Decisions read the most recently materialized capability set.
pub struct WriteGate {
    capabilities: Arc<CapabilityMaterializer>,
    members_only: bool,
    content: Arc<dyn ContentStore>,
}

impl WriteGate {
    pub fn new(
        capabilities: Arc<CapabilityMaterializer>,
        members_only: bool,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            capabilities,
            members_only,
            content,
        }
    }

    pub fn members_only(&self) -> bool {
        self.members_only
    }

    /// Author of the thread entry stored under `target`.
    async fn original_author(&self, target: &EntryHash) -> Option<IdentityId> {
        let bytes = match self.content.resolve_by_hash(target).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!(%target, "delete target not found");
                return None;
            }
            Err(e) => {
                tracing::debug!(%target, error = %e, "delete target unresolvable");
                return None;
            }
        };

        match LogEntry::<ThreadEntry>::from_bytes(&bytes) {
            Ok(entry) => Some(entry.identity.id),
            Err(e) => {
                tracing::debug!(%target, error = %e, "delete target is not a thread entry");
                None
            }
        }
    }
}

#[async_trait]
impl AccessController<ThreadEntry> for WriteGate {
    fn type_tag(&self) -> &str {
        THREAD_ACCESS
    }

    async fn can_append(
        &self,
        entry: &LogEntry<ThreadEntry>,
        verifier: &dyn IdentityVerifier,
    ) -> bool {
        let author = entry.author();
        let capabilities = self.capabilities.current();

        let allowed = match entry.payload.op {
            ThreadOp::Add => {
                let allowed = !self.members_only || capabilities.may_write(author.as_str());
                if !allowed {
                    tracing::debug!(%author, "add denied: not a member");
                }
                allowed
            }
            ThreadOp::Del => match entry.payload.target() {
                Some(target) => match self.original_author(&target).await {
                    Some(original) => {
                        let allowed =
                            &original == author || capabilities.is_moderator(author.as_str());
                        if !allowed {
                            tracing::debug!(%author, %original, "delete denied: not author or moderator");
                        }
                        allowed
                    }
                    None => false,
                },
                None => {
                    tracing::debug!(%author, "delete denied: malformed target");
                    false
                }
            },
            ThreadOp::Unknown => {
                tracing::debug!(%author, "denied: unknown op");
                false
            }
        };

        allowed && verify_or_deny(verifier, &entry.identity).await
    }
}
