//! The thread: a content log gated by a grant log.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;
use tokio::sync::watch;

use threadgate_access::{
    Capability, CapabilityMaterializer, CapabilityRegistry, CapabilitySet, ConfidentialityError,
    GrantEntry, GrantProtocol, ReadKey, RegistryManifest, SealedPayload, ThreadEntry,
    ThreadManifest, ThreadOp, WrappedReadKey, WriteGate, X25519PublicKey, X25519StaticSecret,
};
use threadgate_core::{EntryHash, IdentityId, IdentityKeys, IdentityVerifier, LogEntry};
use threadgate_store::{
    LogAddress, LogConfig, LogStore, MemoryContentStore, MemoryLog, ReplicationReport,
};

use crate::config::ThreadConfig;
use crate::error::{Result, ThreadError};

/// A visible post: an `ADD` that no later `DEL` targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub hash: EntryHash,
    pub author: IdentityId,
    pub content: Bytes,
}

/// Outcome of [`Thread::sync_from`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub grants: ReplicationReport,
    pub posts: ReplicationReport,
}

/// A moderated thread as seen by one local identity.
///
/// Wires together:
///
/// - the grant log, gated by a [`CapabilityRegistry`] and observed by a
///   [`CapabilityMaterializer`]
/// - the content log, gated by a [`WriteGate`] reading the materialized set
/// - a content store shared by both logs, used to resolve delete targets
pub struct Thread {
    config: ThreadConfig,
    keys: IdentityKeys,
    registry: Arc<CapabilityRegistry>,
    capabilities: Arc<CapabilityMaterializer>,
    grants: Arc<MemoryLog<GrantEntry>>,
    posts: Arc<MemoryLog<ThreadEntry>>,
    protocol: GrantProtocol,
    read_key: RwLock<Option<ReadKey>>,
}

impl Thread {
    /// Create a new thread governed by `config.access`.
    pub async fn create(
        config: ThreadConfig,
        keys: IdentityKeys,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Result<Self> {
        let thread = Self::build(config, keys, verifier)?;
        thread.load().await;

        tracing::info!(
            address = %thread.address(),
            first_moderator = %thread.registry.first_moderator(),
            members_only = thread.registry.members_only(),
            confidential = thread.protocol.is_confidential(),
            "thread created"
        );
        Ok(thread)
    }

    /// Open an existing thread from its manifest.
    pub async fn open(
        manifest: &ThreadManifest,
        keys: IdentityKeys,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Result<Self> {
        let config = ThreadConfig::new(manifest.address.name(), manifest.access_config()?);
        let thread = Self::build(config, keys, verifier)?;

        if thread.address() != &manifest.address {
            return Err(ThreadError::InvalidOperation(format!(
                "manifest address {} does not match {}",
                manifest.address,
                thread.address()
            )));
        }
        thread.load().await;

        tracing::info!(address = %thread.address(), identity = %thread.identity(), "thread opened");
        Ok(thread)
    }

    fn build(
        config: ThreadConfig,
        keys: IdentityKeys,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Result<Self> {
        config.validate()?;

        let content = Arc::new(MemoryContentStore::new());
        let log_config = LogConfig {
            verify_entry_signatures: config.verify_entry_signatures,
            ..LogConfig::default()
        };

        let registry = Arc::new(CapabilityRegistry::new(config.access.clone())?);
        let capabilities = Arc::new(CapabilityMaterializer::new(&registry));

        let grants = Arc::new(
            MemoryLog::<GrantEntry>::new(
                &config.name,
                keys.clone(),
                registry.clone(),
                Arc::clone(&verifier),
                content.clone(),
            )
            .with_config(log_config.clone()),
        );
        grants.subscribe(capabilities.clone());

        let gate = Arc::new(WriteGate::new(
            Arc::clone(&capabilities),
            config.access.members_only,
            content.clone(),
        ));
        let posts = Arc::new(
            MemoryLog::<ThreadEntry>::new(&config.name, keys.clone(), gate, verifier, content)
                .with_config(log_config),
        );

        let protocol = GrantProtocol::new(
            Arc::clone(&registry),
            Arc::clone(&capabilities),
            grants.clone(),
        );

        Ok(Self {
            config,
            keys,
            registry,
            capabilities,
            grants,
            posts,
            protocol,
            read_key: RwLock::new(None),
        })
    }

    async fn load(&self) {
        self.grants.load().await;
        self.posts.load().await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Address of the content log.
    pub fn address(&self) -> &LogAddress {
        self.posts.address()
    }

    /// Address of the grant log.
    pub fn grant_log_address(&self) -> &LogAddress {
        self.grants.address()
    }

    /// The local identity.
    pub fn identity(&self) -> &IdentityId {
        self.keys.id()
    }

    pub fn config(&self) -> &ThreadConfig {
        &self.config
    }

    pub fn manifest(&self) -> ThreadManifest {
        ThreadManifest::new(self.address().clone(), &self.config.access)
    }

    pub fn registry_manifest(&self) -> Result<RegistryManifest> {
        Ok(self.registry.manifest()?)
    }

    /// The most recently materialized capabilities.
    pub fn capabilities(&self) -> Arc<CapabilitySet> {
        self.capabilities.current()
    }

    pub fn moderators(&self) -> Vec<IdentityId> {
        self.capabilities().moderators().to_vec()
    }

    pub fn members(&self) -> Vec<IdentityId> {
        self.capabilities().members().to_vec()
    }

    /// Notified after every capability rebuild.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.capabilities.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Content
    // ─────────────────────────────────────────────────────────────────────────

    /// Post `content` as the local identity.
    pub async fn post(&self, content: impl Into<Bytes>) -> Result<EntryHash> {
        Ok(self.posts.append(ThreadEntry::add(content)).await?)
    }

    /// Post `plaintext` sealed with the thread read key.
    pub async fn post_sealed(&self, plaintext: &[u8]) -> Result<EntryHash> {
        let sealed = {
            let key = self.read_key.read().unwrap_or_else(PoisonError::into_inner);
            let key = key.as_ref().ok_or_else(read_key_missing)?;
            SealedPayload::seal(plaintext, key)?
        };
        self.post(sealed.to_bytes()?).await
    }

    /// Decrypt a post made with [`post_sealed`](Self::post_sealed).
    pub fn open_sealed(&self, post: &Post) -> Result<Vec<u8>> {
        let sealed = SealedPayload::from_bytes(&post.content)?;
        let key = self.read_key.read().unwrap_or_else(PoisonError::into_inner);
        let key = key.as_ref().ok_or_else(read_key_missing)?;
        Ok(sealed.open(key)?)
    }

    /// Delete the entry at `target`.
    pub async fn delete(&self, target: &EntryHash) -> Result<EntryHash> {
        if self.posts.get(target).await.is_none() {
            return Err(ThreadError::EntryNotFound(*target));
        }
        Ok(self.posts.append(ThreadEntry::del(target)).await?)
    }

    /// Look up a thread log entry.
    pub async fn get(&self, hash: &EntryHash) -> Option<LogEntry<ThreadEntry>> {
        self.posts.get(hash).await
    }

    /// Visible posts in log order.
    pub async fn posts(&self) -> Result<Vec<Post>> {
        let snapshot = self.posts.snapshot().await;

        let deleted: HashSet<EntryHash> = snapshot
            .iter()
            .filter_map(|entry| entry.payload.target())
            .collect();

        let mut posts = Vec::new();
        for entry in &snapshot {
            if entry.payload.op != ThreadOp::Add {
                continue;
            }
            let hash = entry.hash()?;
            if deleted.contains(&hash) {
                continue;
            }
            posts.push(Post {
                hash,
                author: entry.author().clone(),
                content: entry.payload.value.clone(),
            });
        }
        Ok(posts)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Grants
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `capability` to `id` on a non-confidential thread.
    pub async fn grant(
        &self,
        capability: Capability,
        id: impl Into<IdentityId>,
    ) -> Result<EntryHash> {
        Ok(self.protocol.grant(capability, id, None).await?)
    }

    /// Grant `capability` to `id`, wrapping the read key to `recipient_public`.
    pub async fn grant_with_key(
        &self,
        capability: Capability,
        id: impl Into<IdentityId>,
        recipient_public: &X25519PublicKey,
    ) -> Result<EntryHash> {
        let id = id.into();
        let wrapped = {
            let key = self.read_key.read().unwrap_or_else(PoisonError::into_inner);
            let key = key.as_ref().ok_or_else(read_key_missing)?;
            WrappedReadKey::wrap(key, &id, recipient_public)?.to_bytes()?
        };
        Ok(self
            .protocol
            .grant(capability, id, Some(Bytes::from(wrapped)))
            .await?)
    }

    pub async fn add_moderator(&self, id: impl Into<IdentityId>) -> Result<EntryHash> {
        self.grant(Capability::Moderator, id).await
    }

    pub async fn add_member(&self, id: impl Into<IdentityId>) -> Result<EntryHash> {
        self.grant(Capability::Member, id).await
    }

    /// The wrapped read key granted to `id`.
    pub async fn encrypted_key(&self, id: &IdentityId) -> Result<Bytes> {
        Ok(self.protocol.encrypted_key(id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read key
    // ─────────────────────────────────────────────────────────────────────────

    /// Install the thread read key. It must match the thread's key id.
    pub fn set_read_key(&self, key: ReadKey) -> Result<()> {
        let expected = self
            .registry
            .enc_key_id()
            .ok_or(ConfidentialityError::NotConfidential)
            .map_err(threadgate_access::AccessError::from)?;
        if key.key_id() != expected {
            return Err(ThreadError::InvalidOperation(format!(
                "read key {} does not match thread key {}",
                key.key_id(),
                expected
            )));
        }
        *self.read_key.write().unwrap_or_else(PoisonError::into_inner) = Some(key);
        Ok(())
    }

    /// Recover the read key from the local identity's grant.
    pub async fn unlock(&self, secret: &X25519StaticSecret) -> Result<ReadKey> {
        let blob = self.encrypted_key(self.identity()).await?;
        let key = WrappedReadKey::from_bytes(&blob)?.unwrap_key(self.identity(), secret)?;
        self.set_read_key(key.clone())?;
        tracing::debug!(address = %self.address(), identity = %self.identity(), "read key unlocked");
        Ok(key)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Replication
    // ─────────────────────────────────────────────────────────────────────────

    /// Pull `peer`'s grant log, then its content log.
    ///
    /// Grants go first so that content they authorize is accepted in the
    /// same round.
    pub async fn sync_from(&self, peer: &Thread) -> Result<SyncReport> {
        let grants = self.replicate_grants_from(peer).await?;
        let posts = self.replicate_posts_from(peer).await?;
        Ok(SyncReport { grants, posts })
    }

    pub async fn replicate_grants_from(&self, peer: &Thread) -> Result<ReplicationReport> {
        self.check_same_thread(peer)?;
        let entries = peer.grants.snapshot().await.entries().to_vec();
        Ok(self.grants.replicate(entries).await?)
    }

    pub async fn replicate_posts_from(&self, peer: &Thread) -> Result<ReplicationReport> {
        self.check_same_thread(peer)?;
        let entries = peer.posts.snapshot().await.entries().to_vec();
        Ok(self.posts.replicate(entries).await?)
    }

    fn check_same_thread(&self, peer: &Thread) -> Result<()> {
        if peer.address() != self.address() {
            return Err(ThreadError::InvalidOperation(format!(
                "cannot replicate {} into {}",
                peer.address(),
                self.address()
            )));
        }
        Ok(())
    }
}

fn read_key_missing() -> ThreadError {
    ThreadError::InvalidOperation("thread read key is not available".into())
}
