//! # bansync store
//!
//! Store adapters for the shared `userbans` table.
//!
//! The sync engine talks to a single [`Connector`] chosen at startup. Each
//! call to [`Connector::connect`] yields a fresh [`BanTable`] handle scoped to
//! one phase of work; dropping the handle closes it.
//!
//! ## Available Backends
//!
//! - [`SqliteConnector`] - embedded file store (rusqlite)
//! - [`MySqlConnector`] - networked store (mysql)
//! - [`MemoryStore`] - in-process table for tests, with failure injection
//!
//! The SQL backends share one [`SqlBanTable`] implementation. Dialect
//! differences (bulk upsert syntax, key column type, table lookup) live in
//! [`Dialect`]; every value is parameter-bound.
//!
//! ## Example
//!
//! ```rust
//! use bansync_core::IdentityRecord;
//! use bansync_store::{BanTable, Connector, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let mut table = store.connect().unwrap();
//! if !table.table_exists().unwrap() {
//!     table.create_table().unwrap();
//! }
//! table.upsert(&[IdentityRecord::new(1u64, "a", "r1")]).unwrap();
//! assert_eq!(table.fetch_all().unwrap().len(), 1);
//! table.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod mysql_store;
mod settings;
mod sql;
mod sqlite_store;

pub use backend::{BanTable, Connector};
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryCounters, MemoryStore};
pub use mysql_store::{MySqlConnection, MySqlConnector};
pub use settings::{BackendKind, MySqlSettings, StoreSettings};
pub use sql::{Dialect, Row, SqlBanTable, SqlConnection, SqlValue, Statement};
pub use sqlite_store::{SqliteConnection, SqliteConnector};
