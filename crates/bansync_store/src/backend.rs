//! Store adapter traits.

use crate::error::StoreResult;
use bansync_core::{IdentityId, IdentityRecord};

/// Opens handles to the shared ban table.
///
/// One connector is selected at startup from configuration and shared by
/// every phase of the sync engine. Connectors hold no open connection
/// themselves.
pub trait Connector: Send + Sync {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Opens a new handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Connection`] if the backend cannot be
    /// reached or rejects the credentials.
    fn connect(&self) -> StoreResult<Box<dyn BanTable>>;
}

/// A scoped handle to the shared `userbans` table.
///
/// # Invariants
///
/// - Rows are keyed by id alone; `upsert` replaces any row with the same id
/// - `upsert` and `delete` each run as exactly one statement, or none when
///   given an empty slice
/// - Dropping the handle closes it; `close` does so explicitly and reports
///   any error from the backend
pub trait BanTable: Send {
    /// Returns true if the shared table exists.
    fn table_exists(&mut self) -> StoreResult<bool>;

    /// Creates the shared table if it does not exist.
    fn create_table(&mut self) -> StoreResult<()>;

    /// Reads every row of the shared table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::DataShape`] if a row cannot be decoded.
    fn fetch_all(&mut self) -> StoreResult<Vec<IdentityRecord>>;

    /// Inserts or replaces all `records` in one statement.
    ///
    /// Returns the rows affected as reported by the backend.
    fn upsert(&mut self, records: &[IdentityRecord]) -> StoreResult<u64>;

    /// Deletes every row whose id is in `ids`, in one statement.
    fn delete(&mut self, ids: &[IdentityId]) -> StoreResult<u64>;

    /// Closes the handle.
    fn close(self: Box<Self>) -> StoreResult<()>;
}
