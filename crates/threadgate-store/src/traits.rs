//! Store traits: the seams between the access-control core and the log
//! machinery around it.
//!
//! The log store owns ordering and persistence. It consults an
//! [`AccessController`] before accepting any entry, local or remote, and
//! reports every change of its index to registered [`LogObserver`]s. The
//! [`ContentStore`] resolves content-addressed references to earlier entries.

use async_trait::async_trait;
use bytes::Bytes;

use threadgate_core::{EntryHash, IdentityVerifier, LogEntry};

use crate::error::Result;
use crate::log::{LogAddress, LogEvent, LogSnapshot};

/// Decides whether an entry may be appended to a log.
///
/// Denial is signalled by returning `false`, never by an error. The verifier
/// is supplied on every call by the log that owns the controller.
#[async_trait]
pub trait AccessController<P: Send + Sync>: Send + Sync {
    /// Short type tag used in log addresses and manifests.
    fn type_tag(&self) -> &str;

    /// Whether `entry` may be appended. Must not change controller state.
    async fn can_append(&self, entry: &LogEntry<P>, verifier: &dyn IdentityVerifier) -> bool;

    /// Called once `entry` has been stored, before the next entry of the same
    /// log is gated. Controllers that track state derived from accepted
    /// entries update it here.
    async fn on_accepted(&self, _entry: &LogEntry<P>) {}
}

/// Receives a log's lifecycle notifications.
///
/// This is the single re-entry point from a log store into its consumers.
/// The snapshot is taken after the change that triggered the event.
#[async_trait]
pub trait LogObserver<P: Send + Sync>: Send + Sync {
    /// Called after the log became ready, after a local write, and after a
    /// batch of remote entries was accepted.
    async fn on_log_changed(&self, event: LogEvent, snapshot: LogSnapshot<P>);
}

/// Content-addressed storage of encoded entries.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store encoded bytes, returning their hash.
    async fn put(&self, bytes: Bytes) -> Result<EntryHash>;

    /// Look up encoded bytes by hash.
    async fn resolve_by_hash(&self, hash: &EntryHash) -> Result<Option<Bytes>>;
}

/// An append-only log of signed entries.
#[async_trait]
pub trait LogStore<P: Send + Sync + 'static>: Send + Sync {
    /// The log's address.
    fn address(&self) -> &LogAddress;

    /// Sign `payload` as the local identity and append it.
    ///
    /// Returns [`StoreError::AccessDenied`](crate::StoreError::AccessDenied)
    /// if the access controller refuses the entry.
    async fn append(&self, payload: P) -> Result<EntryHash>;

    /// The current index.
    async fn snapshot(&self) -> LogSnapshot<P>;

    /// Look up an entry of this log by hash.
    async fn get(&self, hash: &EntryHash) -> Option<LogEntry<P>>;
}
