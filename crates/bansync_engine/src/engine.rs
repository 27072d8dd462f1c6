//! The sync engine and its cycle phases.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::host::BanHost;
use crate::state::{ApplyReport, CycleReport, SyncState, SyncStats};
use bansync_core::{BanDiff, IdentityId, RecordSet};
use bansync_store::{BanTable, Connector};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// State guarded by the engine lock.
///
/// Cycles and the event bridge both hold this lock for the whole of their
/// store round trip, so the snapshot never changes under a running phase.
#[derive(Debug, Default)]
pub(crate) struct EngineInner {
    /// The ban list both sides agreed on at the last reconciliation.
    pub(crate) snapshot: RecordSet,
    /// Whether bootstrap has completed.
    pub(crate) bootstrapped: bool,
    /// This engine created the shared table but has not finished seeding it.
    /// An empty table then means "not written yet", not "everyone unbanned".
    pub(crate) seed_pending: bool,
}

/// Reconciles a host's local ban list with the shared `userbans` table.
///
/// The engine owns the snapshot and opens a fresh store handle for every
/// phase. Phases may be called directly; [`SyncEngine::tick`] picks the
/// right one for the scheduler.
///
/// A query or data-shape error unloads the engine: every later call
/// returns [`SyncError::Unloaded`]. A connection or host error only fails
/// the current cycle.
pub struct SyncEngine<H: BanHost> {
    config: SyncConfig,
    connector: Box<dyn Connector>,
    host: Arc<H>,
    pub(crate) inner: Mutex<EngineInner>,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    unloaded: AtomicBool,
}

impl<H: BanHost> SyncEngine<H> {
    /// Creates an engine, taking the initial snapshot from the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot list its bans.
    pub fn new(config: SyncConfig, connector: Box<dyn Connector>, host: Arc<H>) -> SyncResult<Self> {
        let snapshot: RecordSet = host.list_banned()?.into_iter().collect();
        debug!(
            backend = connector.name(),
            bans = snapshot.len(),
            "sync engine created"
        );
        Ok(Self {
            config,
            connector,
            host,
            inner: Mutex::new(EngineInner {
                snapshot,
                ..EngineInner::default()
            }),
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            unloaded: AtomicBool::new(false),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the host.
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns a copy of the snapshot.
    pub fn snapshot(&self) -> RecordSet {
        self.inner.lock().snapshot.clone()
    }

    /// Returns true once a fatal error has stopped the engine.
    pub fn is_unloaded(&self) -> bool {
        self.unloaded.load(Ordering::SeqCst)
    }

    /// Returns true once bootstrap has completed.
    pub fn is_bootstrapped(&self) -> bool {
        self.inner.lock().bootstrapped
    }

    /// Stops the engine for good.
    pub fn unload(&self) {
        if !self.unloaded.swap(true, Ordering::SeqCst) {
            info!("ban sync unloaded");
        }
        self.set_state(SyncState::Unloaded);
    }

    /// Ensures the shared table exists, then reconciles.
    ///
    /// A missing table is created and seeded from the local ban list; the
    /// snapshot then equals the local list and nothing is applied. An
    /// existing table is pulled and applied like any other cycle.
    pub fn bootstrap(&self) -> SyncResult<CycleReport> {
        let mut inner = self.begin_cycle()?;
        let result = self.bootstrap_locked(&mut inner);
        self.finish(result)
    }

    /// Reads the shared table and applies its changes to the host.
    pub fn pull_and_apply(&self) -> SyncResult<CycleReport> {
        let mut inner = self.begin_cycle()?;
        self.set_state(SyncState::Connecting);
        let result = self
            .with_table(|table| self.pull_apply(&mut inner, table))
            .map(|applied| CycleReport {
                applied,
                ..CycleReport::default()
            });
        self.finish(result)
    }

    /// Writes host-side changes since the last reconciliation, then pulls.
    ///
    /// Deletes are issued before upserts, and an id that was removed and
    /// re-added under a new name is only upserted.
    pub fn push(&self) -> SyncResult<CycleReport> {
        let mut inner = self.begin_cycle()?;
        let result = self.push_locked(&mut inner);
        self.finish(result)
    }

    /// Runs the next cycle: bootstrap until it succeeds, then push.
    pub fn tick(&self) -> SyncResult<CycleReport> {
        let mut inner = self.begin_cycle()?;
        let result = if inner.bootstrapped {
            self.push_locked(&mut inner)
        } else {
            self.bootstrap_locked(&mut inner)
        };
        self.finish(result)
    }

    fn bootstrap_locked(&self, inner: &mut EngineInner) -> SyncResult<CycleReport> {
        self.set_state(SyncState::Connecting);
        let report = self.with_table(|table| {
            let exists = table.table_exists()?;
            if exists && !inner.seed_pending {
                debug!("shared table present, pulling");
                let applied = self.pull_apply(inner, table)?;
                return Ok(CycleReport {
                    applied,
                    ..CycleReport::default()
                });
            }

            if exists {
                info!("resuming interrupted seed of shared ban table");
            } else {
                table.create_table()?;
                inner.seed_pending = true;
            }
            let local: RecordSet = self.host.list_banned()?.into_iter().collect();
            self.set_state(SyncState::Pushing);
            let seeded = table.upsert(&local.to_sorted_vec())? as usize;
            info!(rows = local.len(), "seeded shared ban table");
            inner.seed_pending = false;
            inner.snapshot = local;
            self.stats.write().rows_upserted += seeded as u64;
            Ok(CycleReport {
                seeded,
                ..CycleReport::default()
            })
        })?;
        inner.bootstrapped = true;
        Ok(report)
    }

    fn push_locked(&self, inner: &mut EngineInner) -> SyncResult<CycleReport> {
        self.set_state(SyncState::Connecting);
        self.with_table(|table| {
            self.set_state(SyncState::Pushing);
            let local: RecordSet = self.host.list_banned()?.into_iter().collect();
            let diff = BanDiff::between(&inner.snapshot, &local);

            let mut report = CycleReport::default();
            if !diff.is_empty() {
                let ids: Vec<IdentityId> =
                    diff.removed_not_readded().map(|r| r.id.clone()).collect();
                report.deleted = table.delete(&ids)? as usize;
                report.upserted = table.upsert(&diff.added)? as usize;
                info!(
                    upserted = report.upserted,
                    deleted = report.deleted,
                    "pushed local ban changes"
                );
                let mut stats = self.stats.write();
                stats.rows_upserted += report.upserted as u64;
                stats.rows_deleted += report.deleted as u64;
            }

            report.applied = self.pull_apply(inner, table)?;
            Ok(report)
        })
    }

    /// Pulls the shared table and applies the difference from the snapshot.
    fn pull_apply(&self, inner: &mut EngineInner, table: &mut dyn BanTable) -> SyncResult<ApplyReport> {
        self.set_state(SyncState::Pulling);
        let remote: RecordSet = table.fetch_all()?.into_iter().collect();

        self.set_state(SyncState::Applying);
        let diff = BanDiff::between(&inner.snapshot, &remote);
        if diff.is_empty() {
            return Ok(ApplyReport::default());
        }

        let local: RecordSet = self.host.list_banned()?.into_iter().collect();
        let mut report = ApplyReport::default();

        for record in diff.removed_not_readded() {
            if local.contains_id(&record.id) {
                self.host.unban(&record.id)?;
                report.unbanned += 1;
                debug!(id = %record.id, "applied remote unban");
            }
            inner.snapshot.remove(&record.id);
        }

        for record in &diff.added {
            if !local.contains(record) {
                self.host.ban(record)?;
                report.banned += 1;
                debug!(id = %record.id, name = %record.name, "applied remote ban");
                if self.host.is_connected(&record.id) {
                    self.host.disconnect(&record.id, &record.reason)?;
                    report.disconnected += 1;
                }
            }
            inner.snapshot.insert(record.clone());
        }

        // The snapshot is what both sides agree on. Host changes made during
        // this cycle stay outside it so the bridge or the next push writes them.
        inner.snapshot = remote;

        if !report.is_empty() {
            info!(
                banned = report.banned,
                unbanned = report.unbanned,
                disconnected = report.disconnected,
                "applied remote ban changes"
            );
        }
        let mut stats = self.stats.write();
        stats.bans_applied += report.banned as u64;
        stats.unbans_applied += report.unbanned as u64;
        stats.disconnects += report.disconnected as u64;
        Ok(report)
    }

    /// Opens a handle, runs `f`, and closes the handle on every path.
    pub(crate) fn with_table<T>(
        &self,
        f: impl FnOnce(&mut dyn BanTable) -> SyncResult<T>,
    ) -> SyncResult<T> {
        let mut table = self.connector.connect()?;
        let result = f(table.as_mut());
        if let Err(e) = table.close() {
            warn!(error = %e, "failed to close store handle");
        }
        result
    }

    /// Takes the engine lock for a cycle.
    ///
    /// Between cycles the state is always one that [`SyncState::can_start_cycle`]
    /// accepts. Anything else means a phase unwound mid-way; that cycle is
    /// counted as failed and the new one proceeds from the current snapshot.
    fn begin_cycle(&self) -> SyncResult<MutexGuard<'_, EngineInner>> {
        let inner = self.lock()?;
        let state = self.state();
        if !state.can_start_cycle() {
            warn!(?state, "previous sync cycle was interrupted");
            self.stats.write().cycles_failed += 1;
        }
        Ok(inner)
    }

    pub(crate) fn lock(&self) -> SyncResult<MutexGuard<'_, EngineInner>> {
        let inner = self.inner.lock();
        if self.is_unloaded() {
            return Err(SyncError::Unloaded);
        }
        Ok(inner)
    }

    /// Records the outcome of a cycle.
    fn finish(&self, result: SyncResult<CycleReport>) -> SyncResult<CycleReport> {
        match &result {
            Ok(report) => {
                self.set_state(SyncState::Scheduled);
                let mut stats = self.stats.write();
                stats.cycles_completed += 1;
                stats.last_cycle_time = Some(Instant::now());
                stats.last_error = None;
                debug!(?report, "sync cycle complete");
            }
            Err(e) => {
                self.record_error(e);
                if !e.is_fatal() {
                    self.set_state(SyncState::Failed);
                    self.stats.write().cycles_failed += 1;
                }
            }
        }
        result
    }

    /// Logs an error and unloads the engine if it is fatal.
    pub(crate) fn record_error(&self, err: &SyncError) {
        self.stats.write().last_error = Some(err.to_string());
        if err.is_fatal() {
            error!(error = %err, "fatal ban sync error");
            self.unload();
        } else {
            warn!(error = %err, "ban sync cycle abandoned");
        }
    }

    fn set_state(&self, state: SyncState) {
        if !self.is_unloaded() || state == SyncState::Unloaded {
            *self.state.write() = state;
        }
    }

    pub(crate) fn record_bridge_write(&self) {
        self.stats.write().bridge_writes += 1;
    }
}

impl<H: BanHost> std::fmt::Debug for SyncEngine<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("backend", &self.connector.name())
            .field("state", &self.state())
            .field("unloaded", &self.is_unloaded())
            .finish_non_exhaustive()
    }
}
