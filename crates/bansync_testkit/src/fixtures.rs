//! Test fixtures and store helpers.

use bansync_core::{IdentityRecord, RecordSet};
use bansync_store::{BanTable, Connector, SqliteConnector};
use std::path::Path;
use tempfile::TempDir;

/// Builds a record with a numeric id.
pub fn record(id: u64, name: &str, reason: &str) -> IdentityRecord {
    IdentityRecord::new(id, name, reason)
}

/// Builds records from `(id, name, reason)` triples.
pub fn records(triples: &[(u64, &str, &str)]) -> Vec<IdentityRecord> {
    triples
        .iter()
        .map(|(id, name, reason)| record(*id, name, reason))
        .collect()
}

/// Builds a record set from `(id, name, reason)` triples.
pub fn record_set(triples: &[(u64, &str, &str)]) -> RecordSet {
    records(triples).into_iter().collect()
}

/// A SQLite database file in a temporary directory.
///
/// The directory is removed on drop. The table does not exist until
/// [`TempSqlite::seed`] or a bootstrap creates it.
pub struct TempSqlite {
    connector: SqliteConnector,
    _temp_dir: TempDir,
}

impl TempSqlite {
    /// Creates an empty database path.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let connector = SqliteConnector::new(temp_dir.path().join("bans.db"));
        Self {
            connector,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        self.connector.path()
    }

    /// Returns a boxed connector to hand to an engine.
    pub fn connector(&self) -> Box<dyn Connector> {
        Box::new(self.connector.clone())
    }

    /// Returns true if the `userbans` table exists.
    pub fn has_table(&self) -> bool {
        let mut table = self.open();
        table.table_exists().expect("Failed to check table")
    }

    /// Creates the table if needed and upserts `rows`.
    pub fn seed(&self, rows: &[IdentityRecord]) {
        let mut table = self.open();
        table.create_table().expect("Failed to create table");
        table.upsert(rows).expect("Failed to seed rows");
    }

    /// Deletes every row, keeping the table.
    pub fn clear(&self) {
        let ids: Vec<_> = self.rows().into_iter().map(|r| r.id).collect();
        self.open().delete(&ids).expect("Failed to clear rows");
    }

    /// Returns every row sorted by id.
    pub fn rows(&self) -> Vec<IdentityRecord> {
        let mut rows = self.open().fetch_all().expect("Failed to read rows");
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }

    fn open(&self) -> Box<dyn BanTable> {
        self.connector.connect().expect("Failed to open SQLite store")
    }
}

impl Default for TempSqlite {
    fn default() -> Self {
        Self::new()
    }
}
