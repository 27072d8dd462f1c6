//! Error types for the sync engine.

use bansync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The store could not be reached. Aborts the current cycle only.
    #[error("store unreachable: {0}")]
    Connection(StoreError),

    /// The store rejected a statement. Fatal to the engine.
    #[error("store query failed: {0}")]
    Query(StoreError),

    /// A remote row could not be decoded or an id cannot be stored. Fatal
    /// to the engine.
    #[error("malformed ban data: {0}")]
    DataShape(StoreError),

    /// The host failed to list, ban, unban, or disconnect.
    #[error("host error: {0}")]
    Host(String),

    /// Configuration could not be encoded or decoded.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine unloaded itself after a fatal error.
    #[error("ban sync is unloaded")]
    Unloaded,
}

impl SyncError {
    /// Creates a host error.
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host(message.into())
    }

    /// Returns true if this error must unload the engine.
    ///
    /// A sync engine that failed a statement or read malformed data stops
    /// rather than risk silently diverging.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Query(_) | SyncError::DataShape(_))
    }

    /// Returns true if the next scheduled cycle may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Connection(_) | SyncError::Host(_))
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection { .. } => SyncError::Connection(err),
            StoreError::Query { .. } => SyncError::Query(err),
            StoreError::DataShape(_) => SyncError::DataShape(err),
        }
    }
}
