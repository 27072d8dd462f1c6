//! Sync engine state, statistics, and phase reports.

use std::time::Instant;

/// The current state of the sync engine.
///
/// `Idle` only precedes the first cycle. Bootstrap moves `Connecting →
/// Pulling → Applying → Scheduled`, and each scheduled wake-up runs
/// `Connecting → Pushing → Pulling → Applying → Scheduled`; the engine never
/// returns to `Idle`. `Failed` ends a cycle on a connection or host error
/// and the next scheduled cycle starts over. `Unloaded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Engine created, no cycle run yet.
    Idle,
    /// Opening a store handle.
    Connecting,
    /// Reading the shared table.
    Pulling,
    /// Applying remote changes to the local ban list.
    Applying,
    /// Writing local changes to the shared table.
    Pushing,
    /// Waiting for the next push.
    Scheduled,
    /// The last cycle was abandoned.
    Failed,
    /// A fatal error stopped the engine.
    Unloaded,
}

impl SyncState {
    /// Returns true if a new cycle may start.
    pub fn can_start_cycle(&self) -> bool {
        matches!(
            self,
            SyncState::Idle | SyncState::Scheduled | SyncState::Failed
        )
    }
}

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Cycles (bootstrap or push) completed.
    pub cycles_completed: u64,
    /// Cycles abandoned after a non-fatal error.
    pub cycles_failed: u64,
    /// Remote bans applied locally.
    pub bans_applied: u64,
    /// Remote unbans applied locally.
    pub unbans_applied: u64,
    /// Identities disconnected because of a remote ban.
    pub disconnects: u64,
    /// Rows written to the shared table by cycles.
    pub rows_upserted: u64,
    /// Rows deleted from the shared table by cycles.
    pub rows_deleted: u64,
    /// Single-record writes made by the event bridge.
    pub bridge_writes: u64,
    /// When the last cycle completed.
    pub last_cycle_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// What one apply phase changed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Remote bans applied locally.
    pub banned: usize,
    /// Remote unbans applied locally.
    pub unbanned: usize,
    /// Identities disconnected.
    pub disconnected: usize,
}

impl ApplyReport {
    /// Returns true if nothing changed locally.
    pub fn is_empty(&self) -> bool {
        self.banned == 0 && self.unbanned == 0
    }
}

/// What one cycle changed on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Rows seeded into a freshly created table.
    pub seeded: usize,
    /// Rows upserted by the push phase.
    pub upserted: usize,
    /// Rows deleted by the push phase.
    pub deleted: usize,
    /// Local changes made by the apply phase.
    pub applied: ApplyReport,
}

impl CycleReport {
    /// Returns true if the cycle wrote to the shared table.
    pub fn wrote_remote(&self) -> bool {
        self.seeded > 0 || self.upserted > 0 || self.deleted > 0
    }
}
