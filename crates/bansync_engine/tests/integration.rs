//! Integration tests for the sync engine against SQLite and the memory store.

use bansync_core::{IdentityId, IdentityRecord, RecordSet};
use bansync_engine::{
    BanHost, BridgeOutcome, MemoryHost, SyncConfig, SyncEngine, SyncError, SyncScheduler,
    SyncState,
};
use bansync_store::{
    BanTable, Connector, MemoryStore, SqliteConnector, StoreError, StoreResult, StoreSettings,
};
use bansync_testkit::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn sqlite_engine(store: &TempSqlite, host: MemoryHost) -> SyncEngine<MemoryHost> {
    let config = SyncConfig::new(StoreSettings::sqlite(store.path()));
    SyncEngine::new(config, store.connector(), Arc::new(host)).unwrap()
}

#[test]
fn bootstrap_seeds_empty_remote() {
    let store = TempSqlite::new();
    let engine = sqlite_engine(
        &store,
        MemoryHost::with_bans(records(&[(1, "a", "r1"), (2, "b", "r2")])),
    );

    let report = engine.tick().unwrap();
    assert_eq!(report.seeded, 2);
    assert!(store.has_table());
    assert_eq!(store.rows(), records(&[(1, "a", "r1"), (2, "b", "r2")]));
    assert_eq!(engine.snapshot(), engine.host().bans());
}

#[test]
fn apply_bans_missing_remote_identity() {
    let store = TempSqlite::new();
    store.seed(&records(&[(5, "x", "spam"), (9, "y", "cheat")]));

    let host = MemoryHost::with_bans(records(&[(5, "x", "spam")]));
    host.connect(IdentityId::from(9));
    let engine = sqlite_engine(&store, host);

    let report = engine.tick().unwrap();
    assert_eq!(report.applied.banned, 1);
    assert_eq!(report.applied.disconnected, 1);

    let host = engine.host();
    assert_eq!(host.bans(), record_set(&[(5, "x", "spam"), (9, "y", "cheat")]));
    assert_eq!(
        host.disconnects(),
        vec![(IdentityId::from(9), "cheat".to_string())]
    );
    assert_eq!(engine.snapshot(), host.bans());
}

#[test]
fn push_after_apply_writes_nothing() {
    let store = TempSqlite::new();
    store.seed(&records(&[(5, "x", "spam"), (9, "y", "cheat")]));
    let engine = sqlite_engine(&store, MemoryHost::with_bans(records(&[(5, "x", "spam")])));

    engine.tick().unwrap();
    let report = engine.tick().unwrap();
    assert!(!report.wrote_remote());
    assert!(report.applied.is_empty());
}

#[test]
fn clearing_remote_lifts_every_local_ban() {
    let store = TempSqlite::new();
    let engine = sqlite_engine(
        &store,
        MemoryHost::with_bans(records(&[(1, "a", "r"), (2, "b", "r"), (3, "c", "r")])),
    );
    engine.tick().unwrap();

    store.clear();
    let report = engine.tick().unwrap();
    assert_eq!(report.applied.unbanned, 3);
    assert!(engine.host().bans().is_empty());
    assert!(engine.snapshot().is_empty());
}

#[test]
fn host_changes_reach_remote() {
    let store = TempSqlite::new();
    let engine = sqlite_engine(
        &store,
        MemoryHost::with_bans(records(&[(1, "a", "r"), (2, "b", "r")])),
    );
    engine.tick().unwrap();

    engine.host().remove_local_ban(&IdentityId::from(1));
    engine.host().add_local_ban(record(3, "c", "r"));
    engine.host().add_local_ban(record(2, "b2", "r"));

    let report = engine.tick().unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.upserted, 2);
    assert_eq!(store.rows(), records(&[(2, "b2", "r"), (3, "c", "r")]));
}

#[test]
fn quoted_names_round_trip() {
    let store = TempSqlite::new();
    let tricky = IdentityRecord::new(4u64, "O'Brien\"; DROP TABLE userbans; --", "it's \"bad\"");
    let engine = sqlite_engine(&store, MemoryHost::with_bans([tricky.clone()]));

    engine.tick().unwrap();
    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].same_details(&tricky));
}

#[test]
fn textual_ids_match_ignoring_case() {
    let store = TempSqlite::new();
    store.seed(&[IdentityRecord::new(IdentityId::Text("Steve".into()), "s", "r")]);

    let engine = sqlite_engine(
        &store,
        MemoryHost::with_bans([IdentityRecord::new(IdentityId::Text("STEVE".into()), "s", "r")]),
    );
    let report = engine.tick().unwrap();
    assert!(report.applied.is_empty());
    assert!(!engine.tick().unwrap().wrote_remote());
}

#[test]
fn digit_text_ids_settle_after_one_cycle() {
    let store = TempSqlite::new();
    let engine = sqlite_engine(
        &store,
        MemoryHost::with_bans([IdentityRecord::new(IdentityId::Text("0042".into()), "d", "r")]),
    );

    assert_eq!(engine.tick().unwrap().seeded, 1);
    assert_eq!(store.rows()[0].id.to_string(), "42");

    let report = engine.tick().unwrap();
    assert!(!report.wrote_remote());
    assert!(report.applied.is_empty());
}

#[test]
fn two_processes_converge() {
    let store = TempSqlite::new();
    let first = sqlite_engine(&store, MemoryHost::with_bans(records(&[(1, "a", "r")])));
    let second = sqlite_engine(&store, MemoryHost::new());

    first.tick().unwrap();
    second.tick().unwrap();
    assert_eq!(second.host().bans(), record_set(&[(1, "a", "r")]));

    second.host().add_local_ban(record(2, "b", "r"));
    second.on_banned(&record(2, "b", "r")).unwrap();
    first.tick().unwrap();
    assert_eq!(first.host().bans(), record_set(&[(1, "a", "r"), (2, "b", "r")]));

    first.host().remove_local_ban(&IdentityId::from(1));
    first.on_unbanned(&IdentityId::from(1)).unwrap();
    second.tick().unwrap();
    assert_eq!(second.host().bans(), record_set(&[(2, "b", "r")]));
}

#[test]
fn bridge_writes_exactly_once() {
    let store = MemoryStore::with_rows([]);
    let engine = SyncEngine::new(
        SyncConfig::default(),
        Box::new(store.clone()),
        Arc::new(MemoryHost::new()),
    )
    .unwrap();
    engine.tick().unwrap();

    let banned = record(7, "z", "r");
    assert_eq!(engine.on_banned(&banned).unwrap(), BridgeOutcome::Written);
    assert_eq!(
        engine.on_banned(&banned).unwrap(),
        BridgeOutcome::AlreadySynced
    );

    let counters = store.counters();
    assert_eq!(counters.upserts, 1);
    assert_eq!(counters.rows_upserted, 1);
    assert_eq!(store.rows(), vec![banned]);
}

#[test]
fn no_handles_leak_across_paths() {
    let store = MemoryStore::new();
    let host = MemoryHost::with_bans(records(&[(1, "a", "r")]));
    let engine = SyncEngine::new(SyncConfig::default(), Box::new(store.clone()), Arc::new(host))
        .unwrap();

    engine.tick().unwrap();
    engine.tick().unwrap();
    engine.on_banned(&record(2, "b", "r")).unwrap();
    engine.on_unbanned(&IdentityId::from(2)).unwrap();

    store.set_unreachable(true);
    assert!(engine.tick().is_err());
    store.set_unreachable(false);

    store.fail_next_statement("disk I/O error");
    assert!(engine.tick().is_err());

    assert_eq!(store.open_handles(), 0);
    assert!(store.counters().connects >= 5);
}

#[test]
fn malformed_remote_row_unloads() {
    let store = TempSqlite::new();
    store.seed(&records(&[(1, "a", "r")]));
    {
        let mut conn = SqliteConnector::new(store.path()).open().unwrap();
        use bansync_store::{SqlConnection, SqlValue, Statement};
        conn.execute(&Statement::with_params(
            "INSERT INTO userbans (UserId, Name, Reason) VALUES (?, ?, ?)",
            vec![
                SqlValue::Text("   ".into()),
                SqlValue::Text("n".into()),
                SqlValue::Text("r".into()),
            ],
        ))
        .unwrap();
    }

    let engine = sqlite_engine(&store, MemoryHost::new());
    let err = engine.tick().unwrap_err();
    assert!(matches!(err, SyncError::DataShape(_)));
    assert!(engine.is_unloaded());
    assert_eq!(engine.state(), SyncState::Unloaded);
    assert!(matches!(engine.tick(), Err(SyncError::Unloaded)));
}

#[test]
fn unreachable_store_retries_next_cycle() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("no-such-dir").join("bans.db");
    let connector: Box<dyn Connector> = Box::new(SqliteConnector::new(&missing));
    let host = Arc::new(MemoryHost::with_bans(records(&[(1, "a", "r")])));
    let engine = SyncEngine::new(SyncConfig::default(), connector, Arc::clone(&host)).unwrap();

    assert!(matches!(engine.tick(), Err(SyncError::Connection(_))));
    assert_eq!(engine.state(), SyncState::Failed);
    assert!(!engine.is_unloaded());
    assert_eq!(host.list_banned().unwrap().len(), 1);

    std::fs::create_dir_all(missing.parent().unwrap()).unwrap();
    engine.tick().unwrap();
    assert!(engine.is_bootstrapped());
}

#[test]
fn bridge_before_bootstrap_waits_for_seed() {
    let store = TempSqlite::new();
    let engine = sqlite_engine(&store, MemoryHost::new());

    let banned = record(7, "z", "r");
    engine.host().add_local_ban(banned.clone());
    assert_eq!(engine.on_banned(&banned).unwrap(), BridgeOutcome::Deferred);
    assert!(!store.has_table());
    assert!(!engine.is_unloaded());

    let report = engine.tick().unwrap();
    assert_eq!(report.seeded, 1);
    assert_eq!(store.rows(), vec![banned]);
}

/// Wraps a connector so the next upsert fails as if the link dropped.
struct DroppingConnector {
    inner: Box<dyn Connector>,
    drop_upsert: Arc<AtomicBool>,
}

struct DroppingTable {
    inner: Box<dyn BanTable>,
    drop_upsert: Arc<AtomicBool>,
}

impl Connector for DroppingConnector {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn connect(&self) -> StoreResult<Box<dyn BanTable>> {
        Ok(Box::new(DroppingTable {
            inner: self.inner.connect()?,
            drop_upsert: Arc::clone(&self.drop_upsert),
        }))
    }
}

impl BanTable for DroppingTable {
    fn table_exists(&mut self) -> StoreResult<bool> {
        self.inner.table_exists()
    }

    fn create_table(&mut self) -> StoreResult<()> {
        self.inner.create_table()
    }

    fn fetch_all(&mut self) -> StoreResult<Vec<IdentityRecord>> {
        self.inner.fetch_all()
    }

    fn upsert(&mut self, records: &[IdentityRecord]) -> StoreResult<u64> {
        if self.drop_upsert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::connection("sqlite", "database is locked"));
        }
        self.inner.upsert(records)
    }

    fn delete(&mut self, ids: &[IdentityId]) -> StoreResult<u64> {
        self.inner.delete(ids)
    }

    fn close(self: Box<Self>) -> StoreResult<()> {
        self.inner.close()
    }
}

#[test]
fn interrupted_seed_keeps_local_bans() {
    let store = TempSqlite::new();
    let drop_upsert = Arc::new(AtomicBool::new(true));
    let connector = DroppingConnector {
        inner: store.connector(),
        drop_upsert: Arc::clone(&drop_upsert),
    };
    let host = Arc::new(MemoryHost::with_bans(records(&[(1, "a", "r"), (2, "b", "r")])));
    let engine = SyncEngine::new(
        SyncConfig::new(StoreSettings::sqlite(store.path())),
        Box::new(connector),
        Arc::clone(&host),
    )
    .unwrap();

    assert!(matches!(engine.tick(), Err(SyncError::Connection(_))));
    assert!(store.has_table());
    assert!(store.rows().is_empty());

    let report = engine.tick().unwrap();
    assert_eq!(report.seeded, 2);
    assert_eq!(report.applied.unbanned, 0);
    assert_eq!(host.bans(), record_set(&[(1, "a", "r"), (2, "b", "r")]));
    assert_eq!(store.rows(), records(&[(1, "a", "r"), (2, "b", "r")]));
}

#[test]
fn bridge_and_scheduler_interleave_safely() {
    let store = TempSqlite::new();
    let config = SyncConfig::new(StoreSettings::sqlite(store.path()))
        .with_push_delay(Duration::from_millis(1));
    let host = Arc::new(MemoryHost::with_bans(records(&[(1, "a", "r")])));
    let engine = Arc::new(SyncEngine::new(config, store.connector(), Arc::clone(&host)).unwrap());
    let scheduler = SyncScheduler::start(Arc::clone(&engine)).unwrap();

    let bridge = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 2..40u64 {
                let banned = record(i, &format!("n{i}"), "r");
                engine.host().add_local_ban(banned.clone());
                engine.on_banned(&banned).unwrap();
                if i % 3 == 0 {
                    let id = IdentityId::from(i - 1);
                    engine.host().remove_local_ban(&id);
                    engine.on_unbanned(&id).unwrap();
                }
            }
        })
    };
    bridge.join().unwrap();
    scheduler.join();
    assert!(!engine.is_unloaded());

    // One more cycle flushes anything deferred before bootstrap finished.
    engine.tick().unwrap();
    let remote: RecordSet = store.rows().into_iter().collect();
    assert_eq!(remote, host.bans());
    assert_eq!(engine.snapshot(), host.bans());
    assert_eq!(host.bans().len(), 39 - 13);
}
