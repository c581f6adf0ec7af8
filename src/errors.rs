//! Registry Error Hierarchy
//!
//! Defines error types for the registry synchronization core, categorized by
//! the failing collaborator: the coordination store, the payload codec, and
//! the registry protocol itself.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Coordination-store failures (node CRUD, watch registration)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Payload encode/decode failures
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Registry synchronization protocol failures
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Settings loading/validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring supervisor intervention
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Failure kinds surfaced by the coordination-store client.
///
/// `NoNode` and `NodeExists` are distinguishable on purpose: idempotent
/// directory creation treats a concurrent creator's `NodeExists` as success,
/// and subscription treats `NoNode` as expected absence rather than failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No node exists at the given path
    #[error("No node at {0}")]
    NoNode(String),

    /// A node already exists at the given path
    #[error("Node already exists at {0}")]
    NodeExists(String),

    /// The store session has expired; all ephemeral nodes it owned are gone
    #[error("Store session expired")]
    SessionExpired,

    /// Transient connectivity failure; the next watch fire re-synchronizes
    #[error("Connection to store lost: {0}")]
    ConnectionLoss(String),

    /// Data version conflict on a conditional update
    #[error("Version conflict at {0}")]
    BadVersion(String),

    /// The client has been closed and accepts no further calls
    #[error("Store client closed")]
    Closed,

    /// Uncategorized store failure
    #[error("Store failure: {0}")]
    Other(String),
}

// Serialization is classified separately (payloads cross process boundaries)
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Bincode serialization failed: {0}")]
    Bincode(#[from] bincode::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A registry payload could not be decoded into the expected type.
    ///
    /// Fatal for the watcher that read it: a corrupt payload indicates an
    /// incompatible publisher, not a transient store condition.
    #[error("Incompatible payload at {path}")]
    IncompatiblePayload {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// The store event channel closed while the dispatch loop was running
    #[error("Registry dispatch channel closed")]
    DispatchClosed,
}

impl StoreError {
    /// True for "no such node", the expected-absence failure kind.
    pub fn is_no_node(&self) -> bool {
        matches!(self, StoreError::NoNode(_))
    }

    /// True for "node already exists", a recognized success outcome for
    /// idempotent directory creation.
    pub fn is_node_exists(&self) -> bool {
        matches!(self, StoreError::NodeExists(_))
    }
}

impl Error {
    pub fn is_no_node(&self) -> bool {
        matches!(self, Error::Store(e) if e.is_no_node())
    }

    pub fn is_node_exists(&self) -> bool {
        matches!(self, Error::Store(e) if e.is_node_exists())
    }
}

// ============== Conversion Implementations ============== //
impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        CodecError::Bincode(e).into()
    }
}
