//! In-memory implementations of the store traits.
//!
//! [`MemoryLog`] is an in-process append-only log with a pluggable access
//! controller and lifecycle observers. [`MemoryContentStore`] is the
//! content-addressed blob map every accepted entry is written to. Neither
//! persists anything; replication is simulated by handing signed entries from
//! one log to another with [`MemoryLog::replicate`].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use threadgate_core::{
    validate_entry, EntryHash, IdentityId, IdentityKeys, IdentityVerifier, LogEntry,
    ValidationError,
};

use crate::error::{Result, StoreError};
use crate::log::{LogAddress, LogEvent, LogSnapshot};
use crate::traits::{AccessController, ContentStore, LogObserver, LogStore};

/// In-memory content-addressed store.
///
/// Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<EntryHash, Bytes>>,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, bytes: Bytes) -> Result<EntryHash> {
        let hash = EntryHash::of(&bytes);
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(hash)
            .or_insert(bytes);
        Ok(hash)
    }

    async fn resolve_by_hash(&self, hash: &EntryHash) -> Result<Option<Bytes>> {
        Ok(self
            .blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(hash)
            .cloned())
    }
}

/// Default for [`LogConfig::max_clock_drift`].
pub const DEFAULT_MAX_CLOCK_DRIFT: u64 = 1 << 32;

/// Configuration for a [`MemoryLog`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to check entry signatures before consulting the access
    /// controller.
    pub verify_entry_signatures: bool,

    /// How far past the highest clock in the index an incoming entry's clock
    /// may be. Entries further ahead are invalid.
    pub max_clock_drift: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            verify_entry_signatures: true,
            max_clock_drift: DEFAULT_MAX_CLOCK_DRIFT,
        }
    }
}

/// Outcome of a [`MemoryLog::replicate`] batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplicationReport {
    /// Entries accepted into the index.
    pub accepted: usize,
    /// Entries already present.
    pub duplicate: usize,
    /// Entries the access controller refused.
    pub rejected: usize,
    /// Entries that failed validation.
    pub invalid: usize,
}

struct Index<P> {
    /// Entries in acceptance order. Shared copy-on-write with snapshots.
    entries: Arc<Vec<LogEntry<P>>>,

    /// Hash -> position in `entries`.
    positions: HashMap<EntryHash, usize>,

    /// Highest clock seen.
    max_clock: u64,
}

/// In-memory append-only log.
pub struct MemoryLog<P: Send + Sync + 'static> {
    address: LogAddress,
    keys: IdentityKeys,
    access: Arc<dyn AccessController<P>>,
    verifier: Arc<dyn IdentityVerifier>,
    content: Arc<dyn ContentStore>,
    config: LogConfig,
    index: RwLock<Index<P>>,
    /// Serializes admission so gate decision and insert are atomic per log.
    write_lock: Mutex<()>,
    observers: RwLock<Vec<Arc<dyn LogObserver<P>>>>,
}

impl<P> MemoryLog<P>
where
    P: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create an empty log.
    ///
    /// `keys` is the local identity that signs appended entries; `verifier`
    /// is passed to the access controller on every decision.
    pub fn new(
        name: &str,
        keys: IdentityKeys,
        access: Arc<dyn AccessController<P>>,
        verifier: Arc<dyn IdentityVerifier>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        let address = LogAddress::derive(name, access.type_tag());
        Self {
            address,
            keys,
            access,
            verifier,
            content,
            config: LogConfig::default(),
            index: RwLock::new(Index {
                entries: Arc::new(Vec::new()),
                positions: HashMap::new(),
                max_clock: 0,
            }),
            write_lock: Mutex::new(()),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Replace the default configuration.
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// The local identity that signs appends.
    pub fn identity(&self) -> &IdentityId {
        self.keys.id()
    }

    /// Register an observer for lifecycle notifications.
    pub fn subscribe(&self, observer: Arc<dyn LogObserver<P>>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signal that the log is ready for use.
    pub async fn load(&self) {
        let snapshot = self.current_snapshot();
        tracing::debug!(log = %self.address, entries = snapshot.len(), "log ready");
        self.notify(LogEvent::Ready, snapshot).await;
    }

    /// Accept entries received from a remote peer.
    ///
    /// Each entry is validated and gated in order. Refused and invalid entries
    /// are dropped silently (counted in the report). Observers receive one
    /// [`LogEvent::Replicated`] if anything was accepted.
    pub async fn replicate(&self, entries: Vec<LogEntry<P>>) -> Result<ReplicationReport> {
        let mut report = ReplicationReport::default();

        let guard = self.write_lock.lock().await;
        for entry in entries {
            let bytes = entry.to_bytes()?;
            let hash = EntryHash::of(&bytes);

            if self.contains(&hash) {
                report.duplicate += 1;
                continue;
            }

            match self.admit(&entry, hash, bytes).await {
                Ok(()) => {
                    self.insert(entry, hash);
                    report.accepted += 1;
                }
                Err(StoreError::AccessDenied { .. }) => {
                    tracing::warn!(log = %self.address, %hash, author = %entry.author(), "replicated entry refused");
                    report.rejected += 1;
                }
                Err(StoreError::Validation(e)) => {
                    tracing::warn!(log = %self.address, %hash, error = %e, "replicated entry invalid");
                    report.invalid += 1;
                }
                Err(e) => return Err(e),
            }
        }
        drop(guard);

        if report.accepted > 0 {
            self.notify(LogEvent::Replicated, self.current_snapshot())
                .await;
        }
        Ok(report)
    }

    fn contains(&self, hash: &EntryHash) -> bool {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .positions
            .contains_key(hash)
    }

    fn current_snapshot(&self) -> LogSnapshot<P> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        LogSnapshot::new(Arc::clone(&index.entries))
    }

    fn max_clock(&self) -> u64 {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .max_clock
    }

    fn check_clock(&self, clock: u64) -> Result<()> {
        let limit = self.max_clock().saturating_add(self.config.max_clock_drift.max(1));
        if clock == 0 || clock > limit {
            return Err(ValidationError::ClockOutOfRange { clock, limit }.into());
        }
        Ok(())
    }

    /// Validate, gate and store the encoded entry. Caller holds `write_lock`.
    ///
    /// The controller hears about the entry only after the content store
    /// accepted it; inserting into the index cannot fail.
    async fn admit(&self, entry: &LogEntry<P>, hash: EntryHash, bytes: Vec<u8>) -> Result<()> {
        if self.config.verify_entry_signatures {
            validate_entry(entry)?;
        }
        self.check_clock(entry.clock)?;

        if !self.access.can_append(entry, self.verifier.as_ref()).await {
            return Err(StoreError::AccessDenied {
                log: self.address.to_string(),
                hash,
            });
        }

        self.content.put(Bytes::from(bytes)).await?;
        self.access.on_accepted(entry).await;
        Ok(())
    }

    fn insert(&self, entry: LogEntry<P>, hash: EntryHash) -> LogSnapshot<P> {
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        index.max_clock = index.max_clock.max(entry.clock);
        let position = index.entries.len();
        Arc::make_mut(&mut index.entries).push(entry);
        index.positions.insert(hash, position);
        LogSnapshot::new(Arc::clone(&index.entries))
    }

    async fn notify(&self, event: LogEvent, snapshot: LogSnapshot<P>) {
        let observers: Vec<_> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.on_log_changed(event, snapshot.clone()).await;
        }
    }
}

#[async_trait]
impl<P> LogStore<P> for MemoryLog<P>
where
    P: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn address(&self) -> &LogAddress {
        &self.address
    }

    async fn append(&self, payload: P) -> Result<EntryHash> {
        let guard = self.write_lock.lock().await;

        let clock = self
            .max_clock()
            .checked_add(1)
            .ok_or_else(|| StoreError::ClockExhausted {
                log: self.address.to_string(),
            })?;
        let entry = LogEntry::sign(&self.keys, clock, payload)?;
        let bytes = entry.to_bytes()?;
        let hash = EntryHash::of(&bytes);

        self.admit(&entry, hash, bytes).await?;
        let snapshot = self.insert(entry, hash);
        drop(guard);

        tracing::debug!(log = %self.address, %hash, clock, "entry appended");
        self.notify(LogEvent::Write, snapshot).await;
        Ok(hash)
    }

    async fn snapshot(&self) -> LogSnapshot<P> {
        self.current_snapshot()
    }

    async fn get(&self, hash: &EntryHash) -> Option<LogEntry<P>> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index
            .positions
            .get(hash)
            .and_then(|&pos| index.entries.get(pos))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use threadgate_core::{Ed25519IdentityVerifier, Keypair};

    /// Allows entries whose payload is even.
    struct EvenOnly;

    #[async_trait]
    impl AccessController<u32> for EvenOnly {
        fn type_tag(&self) -> &str {
            "even-only"
        }

        async fn can_append(&self, entry: &LogEntry<u32>, _v: &dyn IdentityVerifier) -> bool {
            entry.payload % 2 == 0
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: RwLock<Vec<(LogEvent, usize)>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LogObserver<u32> for Recorder {
        async fn on_log_changed(&self, event: LogEvent, snapshot: LogSnapshot<u32>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.events.write().unwrap().push((event, snapshot.len()));
        }
    }

    fn make_log(keys: IdentityKeys) -> MemoryLog<u32> {
        MemoryLog::new(
            "numbers",
            keys,
            Arc::new(EvenOnly),
            Arc::new(Ed25519IdentityVerifier),
            Arc::new(MemoryContentStore::new()),
        )
    }

    #[tokio::test]
    async fn test_append_and_get() {
        let log = make_log(IdentityKeys::generate());
        let hash = log.append(2).await.unwrap();

        let entry = log.get(&hash).await.unwrap();
        assert_eq!(entry.payload, 2);
        assert_eq!(entry.clock, 1);
        assert_eq!(entry.author(), log.identity());
    }

    #[tokio::test]
    async fn test_refused_append_is_typed() {
        let log = make_log(IdentityKeys::generate());
        let err = log.append(3).await.unwrap_err();
        assert!(err.is_access_denied());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_clock_advances_so_reposts_differ() {
        let log = make_log(IdentityKeys::generate());
        let a = log.append(4).await.unwrap();
        let b = log.append(4).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_observers_see_each_change() {
        let log = make_log(IdentityKeys::generate());
        let recorder = Arc::new(Recorder::default());
        log.subscribe(recorder.clone());

        log.load().await;
        log.append(2).await.unwrap();
        let _ = log.append(5).await;

        let events = recorder.events.read().unwrap().clone();
        assert_eq!(events, vec![(LogEvent::Ready, 0), (LogEvent::Write, 1)]);
    }

    #[tokio::test]
    async fn test_replicate_counts_outcomes() {
        let remote = make_log(IdentityKeys::generate());
        let h1 = remote.append(2).await.unwrap();
        remote.append(8).await.unwrap();
        let mut entries = remote.snapshot().await.entries().to_vec();

        // A refused entry signed by another peer.
        let outsider = IdentityKeys::generate();
        entries.push(LogEntry::sign(&outsider, 9, 7u32).unwrap());

        // A tampered entry.
        let mut tampered = LogEntry::sign(&outsider, 10, 10u32).unwrap();
        tampered.payload = 12;
        entries.push(tampered);

        let local = make_log(IdentityKeys::generate());
        let recorder = Arc::new(Recorder::default());
        local.subscribe(recorder.clone());

        let report = local.replicate(entries.clone()).await.unwrap();
        assert_eq!(
            report,
            ReplicationReport {
                accepted: 2,
                duplicate: 0,
                rejected: 1,
                invalid: 1,
            }
        );
        assert!(local.get(&h1).await.is_some());

        let again = local.replicate(entries[..2].to_vec()).await.unwrap();
        assert_eq!(again.duplicate, 2);

        let events = recorder.events.read().unwrap().clone();
        assert_eq!(events, vec![(LogEvent::Replicated, 2)]);
    }

    #[tokio::test]
    async fn test_local_clock_follows_replicated_entries() {
        let remote = make_log(IdentityKeys::generate());
        for n in [2, 4, 6] {
            remote.append(n).await.unwrap();
        }

        let local = make_log(IdentityKeys::with_id("local", Keypair::generate()));
        local
            .replicate(remote.snapshot().await.entries().to_vec())
            .await
            .unwrap();

        let hash = local.append(10).await.unwrap();
        assert_eq!(local.get(&hash).await.unwrap().clock, 4);
    }

    #[tokio::test]
    async fn test_accepted_entries_land_in_content_store() {
        let content = Arc::new(MemoryContentStore::new());
        let log: MemoryLog<u32> = MemoryLog::new(
            "numbers",
            IdentityKeys::generate(),
            Arc::new(EvenOnly),
            Arc::new(Ed25519IdentityVerifier),
            content.clone(),
        );

        let hash = log.append(6).await.unwrap();
        let _ = log.append(7).await;

        assert_eq!(content.len(), 1);
        let bytes = content.resolve_by_hash(&hash).await.unwrap().unwrap();
        let entry: LogEntry<u32> = LogEntry::from_bytes(&bytes).unwrap();
        assert_eq!(entry.payload, 6);
    }

    #[tokio::test]
    async fn test_far_future_clock_is_invalid() {
        let local = make_log(IdentityKeys::generate());
        let peer = IdentityKeys::generate();

        let report = local
            .replicate(vec![
                LogEntry::sign(&peer, u64::MAX, 2u32).unwrap(),
                LogEntry::sign(&peer, 0, 4u32).unwrap(),
            ])
            .await
            .unwrap();
        assert_eq!(report.invalid, 2);
        assert!(local.is_empty());

        let hash = local.append(4).await.unwrap();
        assert_eq!(local.get(&hash).await.unwrap().clock, 1);
    }

    #[tokio::test]
    async fn test_exhausted_clock_is_typed() {
        let local = make_log(IdentityKeys::generate()).with_config(LogConfig {
            max_clock_drift: u64::MAX,
            ..LogConfig::default()
        });
        let peer = IdentityKeys::generate();
        let report = local
            .replicate(vec![LogEntry::sign(&peer, u64::MAX, 2u32).unwrap()])
            .await
            .unwrap();
        assert_eq!(report.accepted, 1);

        let err = local.append(4).await.unwrap_err();
        assert!(matches!(err, StoreError::ClockExhausted { .. }));
        assert_eq!(local.len(), 1);
    }

    /// Accepts everything and counts committed entries.
    #[derive(Default)]
    struct Committed {
        accepted: AtomicUsize,
    }

    #[async_trait]
    impl AccessController<u32> for Committed {
        fn type_tag(&self) -> &str {
            "committed"
        }

        async fn can_append(&self, _entry: &LogEntry<u32>, _v: &dyn IdentityVerifier) -> bool {
            true
        }

        async fn on_accepted(&self, _entry: &LogEntry<u32>) {
            self.accepted.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FullDisk;

    #[async_trait]
    impl ContentStore for FullDisk {
        async fn put(&self, _bytes: Bytes) -> Result<EntryHash> {
            Err(StoreError::Content("no space left".into()))
        }

        async fn resolve_by_hash(&self, _hash: &EntryHash) -> Result<Option<Bytes>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_controller_hears_only_stored_entries() {
        let access = Arc::new(Committed::default());
        let failing: MemoryLog<u32> = MemoryLog::new(
            "numbers",
            IdentityKeys::generate(),
            access.clone(),
            Arc::new(Ed25519IdentityVerifier),
            Arc::new(FullDisk),
        );

        assert!(matches!(
            failing.append(2).await,
            Err(StoreError::Content(_))
        ));
        assert!(failing.is_empty());
        assert_eq!(access.accepted.load(Ordering::SeqCst), 0);

        let working: MemoryLog<u32> = MemoryLog::new(
            "numbers",
            IdentityKeys::generate(),
            access.clone(),
            Arc::new(Ed25519IdentityVerifier),
            Arc::new(MemoryContentStore::new()),
        );
        working.append(3).await.unwrap();
        assert_eq!(access.accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_immutable_after_later_appends() {
        let log = make_log(IdentityKeys::generate());
        log.append(2).await.unwrap();
        let before = log.snapshot().await;
        log.append(4).await.unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(log.snapshot().await.len(), 2);
    }
}
