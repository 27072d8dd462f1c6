//! In-memory store for testing.

use crate::backend::{BanTable, Connector};
use crate::error::{StoreError, StoreResult};
use bansync_core::{IdentityId, IdentityRecord, RecordSet};
use parking_lot::Mutex;
use std::sync::Arc;

const BACKEND: &str = "memory";

/// Statement counters kept by [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCounters {
    /// Successful connects.
    pub connects: u64,
    /// Full-table reads.
    pub reads: u64,
    /// Upsert statements executed.
    pub upserts: u64,
    /// Delete statements executed.
    pub deletes: u64,
    /// Rows written by upserts.
    pub rows_upserted: u64,
    /// Rows removed by deletes.
    pub rows_deleted: u64,
    /// Table creations.
    pub creates: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    table: Option<RecordSet>,
    unreachable: bool,
    fail_next: Option<String>,
    drop_next_write: Option<String>,
    counters: MemoryCounters,
    open_handles: usize,
}

impl MemoryState {
    fn take_failure(&mut self, statement: &str) -> StoreResult<()> {
        match self.fail_next.take() {
            Some(message) => Err(StoreError::query(statement, message)),
            None => Ok(()),
        }
    }

    fn take_write_failure(&mut self, statement: &str) -> StoreResult<()> {
        self.take_failure(statement)?;
        match self.drop_next_write.take() {
            Some(message) => Err(StoreError::connection(BACKEND, message)),
            None => Ok(()),
        }
    }

    fn table_mut(&mut self, statement: &str) -> StoreResult<&mut RecordSet> {
        self.table
            .as_mut()
            .ok_or_else(|| StoreError::query(statement, "no such table: userbans"))
    }
}

/// A shared table held in memory.
///
/// Clones share the same table, so a test can keep one clone for
/// inspection and hand another to the engine. Besides the table itself the
/// store tracks statement counters and open handles, and can simulate an
/// unreachable backend or a failing statement.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates a store whose table does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose table exists and holds `records`.
    pub fn with_rows(records: impl IntoIterator<Item = IdentityRecord>) -> Self {
        let store = Self::new();
        store.state.lock().table = Some(records.into_iter().collect());
        store
    }

    /// Returns true if the table exists.
    pub fn has_table(&self) -> bool {
        self.state.lock().table.is_some()
    }

    /// Returns the rows sorted by id (empty if the table does not exist).
    pub fn rows(&self) -> Vec<IdentityRecord> {
        self.state
            .lock()
            .table
            .as_ref()
            .map(RecordSet::to_sorted_vec)
            .unwrap_or_default()
    }

    /// Inserts a row directly, creating the table if needed.
    pub fn insert_row(&self, record: IdentityRecord) {
        self.state
            .lock()
            .table
            .get_or_insert_with(RecordSet::new)
            .insert(record);
    }

    /// Removes a row directly.
    pub fn remove_row(&self, id: &IdentityId) {
        if let Some(table) = self.state.lock().table.as_mut() {
            table.remove(id);
        }
    }

    /// Removes every row, keeping the table.
    pub fn clear_rows(&self) {
        if let Some(table) = self.state.lock().table.as_mut() {
            *table = RecordSet::new();
        }
    }

    /// Makes subsequent connects fail with a connection error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Makes the next statement fail with a query error.
    pub fn fail_next_statement(&self, message: impl Into<String>) {
        self.state.lock().fail_next = Some(message.into());
    }

    /// Makes the next upsert or delete fail as if the connection dropped.
    pub fn drop_next_write(&self, message: impl Into<String>) {
        self.state.lock().drop_next_write = Some(message.into());
    }

    /// Returns the statement counters.
    pub fn counters(&self) -> MemoryCounters {
        self.state.lock().counters.clone()
    }

    /// Returns the number of handles not yet closed or dropped.
    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }
}

impl Connector for MemoryStore {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn connect(&self) -> StoreResult<Box<dyn BanTable>> {
        let mut state = self.state.lock();
        if state.unreachable {
            return Err(StoreError::connection(BACKEND, "connection refused"));
        }
        state.counters.connects += 1;
        state.open_handles += 1;
        Ok(Box::new(MemoryTable {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryTable {
    state: Arc<Mutex<MemoryState>>,
}

impl BanTable for MemoryTable {
    fn table_exists(&mut self) -> StoreResult<bool> {
        let mut state = self.state.lock();
        state.take_failure("table_exists")?;
        Ok(state.table.is_some())
    }

    fn create_table(&mut self) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.take_failure("create_table")?;
        state.counters.creates += 1;
        state.table.get_or_insert_with(RecordSet::new);
        Ok(())
    }

    fn fetch_all(&mut self) -> StoreResult<Vec<IdentityRecord>> {
        let mut state = self.state.lock();
        state.take_failure("select_all")?;
        let rows = state.table_mut("select_all")?.to_sorted_vec();
        state.counters.reads += 1;
        Ok(rows)
    }

    fn upsert(&mut self, records: &[IdentityRecord]) -> StoreResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut state = self.state.lock();
        state.take_write_failure("upsert")?;
        state.table_mut("upsert")?.extend(records.iter().cloned());
        state.counters.upserts += 1;
        state.counters.rows_upserted += records.len() as u64;
        Ok(records.len() as u64)
    }

    fn delete(&mut self, ids: &[IdentityId]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut state = self.state.lock();
        state.take_write_failure("delete")?;
        let table = state.table_mut("delete")?;
        let removed = ids.iter().filter(|id| table.remove(id).is_some()).count() as u64;
        state.counters.deletes += 1;
        state.counters.rows_deleted += removed;
        Ok(removed)
    }

    fn close(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

impl Drop for MemoryTable {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
    }
}
