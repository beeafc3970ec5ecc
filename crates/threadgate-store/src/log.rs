//! Log addresses, lifecycle events and immutable index snapshots.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use threadgate_core::{EntryHash, LogEntry};

/// Scheme prefix of in-process log addresses.
pub const MEMLOG_SCHEME: &str = "memlog";

/// The address of a log.
///
/// Format: `/memlog/<hex>/<name>` where `<hex>` is the first 16 bytes of
/// Blake3(`<access tag>/<name>`). The access tag is the type tag of the log's
/// access controller, so two logs with the same name but different policies
/// never share an address.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogAddress(String);

impl LogAddress {
    /// Derive the address for a log name under an access controller tag.
    pub fn derive(name: &str, access_tag: &str) -> Self {
        let digest = EntryHash::of(format!("{}/{}", access_tag, name).as_bytes());
        Self(format!(
            "/{}/{}/{}",
            MEMLOG_SCHEME,
            &digest.to_hex()[..32],
            name
        ))
    }

    /// Parse an address string, returning `None` if it is not a memlog address.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.strip_prefix('/')?.splitn(3, '/');
        let scheme = parts.next()?;
        let digest = parts.next()?;
        let name = parts.next()?;
        if scheme != MEMLOG_SCHEME || digest.len() != 32 || name.is_empty() {
            return None;
        }
        Some(Self(s.to_string()))
    }

    /// The log name component.
    pub fn name(&self) -> &str {
        self.0.splitn(4, '/').nth(3).unwrap_or_default()
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LogAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogAddress({})", self.0)
    }
}

impl fmt::Display for LogAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle notifications fired by a log store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEvent {
    /// The log finished loading and is ready for use.
    Ready,
    /// A local append completed.
    Write,
    /// Entries from a remote peer were accepted.
    Replicated,
}

/// An immutable view of a log's index at one instant.
///
/// Cloning is cheap; the entries are shared.
#[derive(Debug)]
pub struct LogSnapshot<P> {
    entries: Arc<Vec<LogEntry<P>>>,
}

impl<P> LogSnapshot<P> {
    /// Wrap a shared index.
    pub fn new(entries: Arc<Vec<LogEntry<P>>>) -> Self {
        Self { entries }
    }

    /// An empty snapshot.
    pub fn empty() -> Self {
        Self {
            entries: Arc::new(Vec::new()),
        }
    }

    /// The entries in index order.
    pub fn entries(&self) -> &[LogEntry<P>] {
        &self.entries
    }

    /// Iterate entries in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry<P>> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P> Clone for LogSnapshot<P> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<'a, P> IntoIterator for &'a LogSnapshot<P> {
    type Item = &'a LogEntry<P>;
    type IntoIter = std::slice::Iter<'a, LogEntry<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
