//! Host notifications written straight to the shared table.

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use crate::host::BanHost;
use bansync_core::{IdentityId, IdentityRecord};
use tracing::debug;

/// What a bridge notification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// One statement was written to the shared table.
    Written,
    /// The snapshot already reflected the change; nothing was written.
    AlreadySynced,
    /// Bootstrap has not completed, so nothing was written. The next
    /// bootstrap seeds or reconciles the change from the host's list.
    Deferred,
}

impl<H: BanHost> SyncEngine<H> {
    /// Handles a host notification that `record` was banned.
    ///
    /// Writes a single upsert on its own handle unless the snapshot already
    /// holds the same id and name, then replaces the snapshot entry. Runs
    /// under the engine lock, so it never interleaves with a cycle phase.
    ///
    /// Before bootstrap the shared table may not exist yet; the store is
    /// left alone and [`BridgeOutcome::Deferred`] is returned.
    pub fn on_banned(&self, record: &IdentityRecord) -> SyncResult<BridgeOutcome> {
        let mut inner = self.lock()?;
        if !inner.bootstrapped {
            debug!(id = %record.id, "ban deferred until bootstrap");
            return Ok(BridgeOutcome::Deferred);
        }
        if inner.snapshot.contains(record) {
            return Ok(BridgeOutcome::AlreadySynced);
        }

        let result = self.with_table(|table| Ok(table.upsert(std::slice::from_ref(record))?));
        if let Err(e) = &result {
            self.record_error(e);
        }
        result?;

        inner.snapshot.insert(record.clone());
        self.record_bridge_write();
        debug!(id = %record.id, name = %record.name, "bridged ban");
        Ok(BridgeOutcome::Written)
    }

    /// Handles a host notification that `id` was unbanned.
    ///
    /// Writes a single delete if the snapshot holds the id. Deferred before
    /// bootstrap, like [`SyncEngine::on_banned`].
    pub fn on_unbanned(&self, id: &IdentityId) -> SyncResult<BridgeOutcome> {
        let mut inner = self.lock()?;
        if !inner.bootstrapped {
            debug!(%id, "unban deferred until bootstrap");
            return Ok(BridgeOutcome::Deferred);
        }
        if !inner.snapshot.contains_id(id) {
            return Ok(BridgeOutcome::AlreadySynced);
        }

        let result = self.with_table(|table| Ok(table.delete(std::slice::from_ref(id))?));
        if let Err(e) = &result {
            self.record_error(e);
        }
        result?;

        inner.snapshot.remove(id);
        self.record_bridge_write();
        debug!(id = %id, "bridged unban");
        Ok(BridgeOutcome::Written)
    }
}
