//! Capability materialization.
//!
//! The capability set is never updated incrementally. Every change to the
//! grant log triggers a full replay of one snapshot of its index, starting
//! from the bootstrap moderator. Replays are deterministic, so every peer that
//! has seen the same grants derives the same set.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::watch;

use threadgate_core::{IdentityId, LogEntry};
use threadgate_store::{LogEvent, LogObserver, LogSnapshot};

use crate::capability::CapabilitySet;
use crate::payload::GrantEntry;
use crate::registry::CapabilityRegistry;

/// Replay grant entries in index order.
///
/// MODERATOR grants append the target if absent. MEMBER grants do the same
/// for members.
pub fn materialize<'a, I>(first_moderator: &IdentityId, entries: I) -> CapabilitySet
where
    I: IntoIterator<Item = &'a LogEntry<GrantEntry>>,
{
    let mut set = CapabilitySet::bootstrap(first_moderator.clone());
    let mut replayed = 0;
    for entry in entries {
        set.insert(entry.payload.capability, &entry.payload.id);
        replayed += 1;
    }
    set.set_source_len(replayed);
    set
}

/// Keeps the current [`CapabilitySet`] of a thread.
///
/// Registered as an observer of the grant log. Readers get the most recently
/// completed set; it is replaced wholesale on every rebuild.
pub struct CapabilityMaterializer {
    first_moderator: IdentityId,
    current: RwLock<Arc<CapabilitySet>>,
    /// Rebuild generation; bumped after every completed rebuild.
    updates: watch::Sender<u64>,
}

impl CapabilityMaterializer {
    pub fn new(registry: &CapabilityRegistry) -> Self {
        Self::with_first_moderator(registry.first_moderator().clone())
    }

    pub fn with_first_moderator(first_moderator: IdentityId) -> Self {
        let current = RwLock::new(Arc::new(CapabilitySet::bootstrap(first_moderator.clone())));
        let (updates, _) = watch::channel(0);
        Self {
            first_moderator,
            current,
            updates,
        }
    }

    /// The most recently materialized set.
    pub fn current(&self) -> Arc<CapabilitySet> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Receive a notification after every rebuild.
    ///
    /// The value is the rebuild generation; only the change matters.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    /// Number of completed rebuilds.
    pub fn generation(&self) -> u64 {
        *self.updates.borrow()
    }

    /// Rebuild from `snapshot` and notify subscribers.
    ///
    /// A snapshot shorter than the one the current set was built from is
    /// older than it and is ignored. Returns whether the set was replaced.
    pub fn rebuild(&self, snapshot: &LogSnapshot<GrantEntry>) -> bool {
        let set = materialize(&self.first_moderator, snapshot);

        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            if set.source_len() < current.source_len() {
                tracing::debug!(
                    stale = set.source_len(),
                    current = current.source_len(),
                    "ignoring stale grant log snapshot"
                );
                return false;
            }
            *current = Arc::new(set);
        }

        self.updates.send_modify(|generation| *generation += 1);
        true
    }
}

#[async_trait]
impl LogObserver<GrantEntry> for CapabilityMaterializer {
    async fn on_log_changed(&self, event: LogEvent, snapshot: LogSnapshot<GrantEntry>) {
        if self.rebuild(&snapshot) {
            let set = self.current();
            tracing::debug!(
                ?event,
                entries = set.source_len(),
                moderators = set.moderators().len(),
                members = set.members().len(),
                "capabilities rebuilt"
            );
        }
    }
}
