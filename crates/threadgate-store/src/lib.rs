//! # Threadgate Store
//!
//! Storage interfaces for Threadgate. The access-control core never talks to a
//! concrete log; it sees the traits in [`traits`] and the event and snapshot
//! types in [`log`].
//!
//! ## Key Types
//!
//! - [`LogStore`] - Append-only log of signed entries
//! - [`AccessController`] - Gate consulted before any entry is accepted
//! - [`LogObserver`] - Receives `Ready` / `Write` / `Replicated` notifications
//! - [`ContentStore`] - Resolves content-addressed references
//! - [`MemoryLog`], [`MemoryContentStore`] - In-process implementations
//!
//! ## Design Notes
//!
//! - **Typed refusal**: an append refused by the access controller fails with
//!   [`StoreError::AccessDenied`], never with a generic error
//! - **Fail-silent replication**: refused remote entries are counted and
//!   dropped, not raised
//! - **Immutable snapshots**: observers get a [`LogSnapshot`] that later
//!   appends never modify

pub mod error;
pub mod log;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use log::{LogAddress, LogEvent, LogSnapshot, MEMLOG_SCHEME};
pub use memory::{
    LogConfig, MemoryContentStore, MemoryLog, ReplicationReport, DEFAULT_MAX_CLOCK_DRIFT,
};
pub use traits::{AccessController, ContentStore, LogObserver, LogStore};
