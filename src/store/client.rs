//! Coordination-store client seam.
//!
//! The store itself (connection/session management, node CRUD, watch
//! registration) is an external collaborator; this module defines only the
//! primitives the registry consumes and the event stream the client delivers
//! them on. Watches are one-shot: a fired watch is consumed and must be
//! re-registered by the handler to keep observing.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;

/// Creation disposition for a new store node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Survives the creating session
    Persistent,
    /// Removed automatically when the creating session ends
    Ephemeral,
    /// Ephemeral, with a store-assigned monotonically increasing name suffix
    EphemeralSequential,
}

/// What a fired watch observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    ChildrenChanged,
    DataChanged,
    NodeDeleted,
}

/// A single fired watch, identified by the path it was armed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: String,
    pub kind: WatchKind,
}

/// Everything the store client delivers on its notification channel.
///
/// All events arrive on one channel and are consumed by a single dispatch
/// task; handlers therefore run serialized, never concurrently with each
/// other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Watch(WatchEvent),
    /// The session died; every ephemeral node it owned is already gone.
    SessionLost,
    /// A fresh session is live again; the registry must run its recovery
    /// protocol before trusting any local state.
    SessionRestored,
}

impl WatchEvent {
    pub fn new(
        path: impl Into<String>,
        kind: WatchKind,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    /// Create a node. For [`CreateMode::EphemeralSequential`] the given path
    /// is a prefix (conventionally ending in `/`) and the store appends the
    /// sequence suffix; the returned string is always the actual path.
    async fn create(
        &self,
        path: &str,
        data: Vec<u8>,
        mode: CreateMode,
    ) -> Result<String>;

    async fn delete(
        &self,
        path: &str,
    ) -> Result<()>;

    async fn set_data(
        &self,
        path: &str,
        data: Vec<u8>,
    ) -> Result<()>;

    /// Check existence; with `watch` the store arms a one-shot data watch on
    /// the path (firing on data change or deletion).
    async fn exists(
        &self,
        path: &str,
        watch: bool,
    ) -> Result<bool>;

    /// Child names (not full paths) under `path`, unordered. With `watch`
    /// the store arms a one-shot children watch.
    async fn get_children(
        &self,
        path: &str,
        watch: bool,
    ) -> Result<Vec<String>>;

    /// Node payload. With `watch` the store arms a one-shot data watch.
    async fn get_data(
        &self,
        path: &str,
        watch: bool,
    ) -> Result<Vec<u8>>;

    /// Release the session; all ephemeral nodes it owns disappear.
    async fn close(&self) -> Result<()>;
}
