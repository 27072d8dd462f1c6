//! The host environment's local ban list.

use crate::error::SyncResult;
use bansync_core::{IdentityId, IdentityRecord, RecordSet};
use parking_lot::RwLock;
use std::collections::HashSet;

/// Access to the host server's local ban list and player connections.
///
/// The host owns the list; the engine reads it and applies remote changes
/// through these actions. Implementations must tolerate being called from
/// the scheduler thread while the host's own threads are active.
pub trait BanHost: Send + Sync {
    /// Returns every identity currently banned locally.
    fn list_banned(&self) -> SyncResult<Vec<IdentityRecord>>;

    /// Bans an identity locally, replacing any ban with the same id.
    fn ban(&self, record: &IdentityRecord) -> SyncResult<()>;

    /// Lifts the local ban for `id`.
    fn unban(&self, id: &IdentityId) -> SyncResult<()>;

    /// Returns true if the identity is currently connected.
    fn is_connected(&self, id: &IdentityId) -> bool;

    /// Forcibly disconnects the identity, showing `message` as the cause.
    fn disconnect(&self, id: &IdentityId, message: &str) -> SyncResult<()>;
}

/// An in-memory host for testing.
///
/// Tracks bans, connected identities, and every disconnect issued.
#[derive(Debug, Default)]
pub struct MemoryHost {
    bans: RwLock<RecordSet>,
    connected: RwLock<HashSet<IdentityId>>,
    disconnects: RwLock<Vec<(IdentityId, String)>>,
    ban_calls: RwLock<u64>,
    unban_calls: RwLock<u64>,
}

impl MemoryHost {
    /// Creates a host with no bans.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host with the given local bans.
    pub fn with_bans(records: impl IntoIterator<Item = IdentityRecord>) -> Self {
        let host = Self::new();
        *host.bans.write() = records.into_iter().collect();
        host
    }

    /// Adds a local ban without going through [`BanHost::ban`], as an
    /// admin command on the host would.
    pub fn add_local_ban(&self, record: IdentityRecord) {
        self.bans.write().insert(record);
    }

    /// Removes a local ban without going through [`BanHost::unban`].
    pub fn remove_local_ban(&self, id: &IdentityId) {
        self.bans.write().remove(id);
    }

    /// Marks an identity as connected.
    pub fn connect(&self, id: IdentityId) {
        self.connected.write().insert(id);
    }

    /// Returns the current local bans.
    pub fn bans(&self) -> RecordSet {
        self.bans.read().clone()
    }

    /// Returns every disconnect issued, in order.
    pub fn disconnects(&self) -> Vec<(IdentityId, String)> {
        self.disconnects.read().clone()
    }

    /// Number of [`BanHost::ban`] calls.
    pub fn ban_calls(&self) -> u64 {
        *self.ban_calls.read()
    }

    /// Number of [`BanHost::unban`] calls.
    pub fn unban_calls(&self) -> u64 {
        *self.unban_calls.read()
    }
}

impl BanHost for MemoryHost {
    fn list_banned(&self) -> SyncResult<Vec<IdentityRecord>> {
        Ok(self.bans.read().to_sorted_vec())
    }

    fn ban(&self, record: &IdentityRecord) -> SyncResult<()> {
        self.bans.write().insert(record.clone());
        *self.ban_calls.write() += 1;
        Ok(())
    }

    fn unban(&self, id: &IdentityId) -> SyncResult<()> {
        self.bans.write().remove(id);
        *self.unban_calls.write() += 1;
        Ok(())
    }

    fn is_connected(&self, id: &IdentityId) -> bool {
        self.connected.read().contains(id)
    }

    fn disconnect(&self, id: &IdentityId, message: &str) -> SyncResult<()> {
        self.connected.write().remove(id);
        self.disconnects
            .write()
            .push((id.clone(), message.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ban_and_unban() {
        let host = MemoryHost::new();
        host.ban(&IdentityRecord::new(1u64, "a", "r")).unwrap();
        assert_eq!(host.list_banned().unwrap().len(), 1);

        host.unban(&IdentityId::from(1)).unwrap();
        assert!(host.list_banned().unwrap().is_empty());
        assert_eq!(host.ban_calls(), 1);
        assert_eq!(host.unban_calls(), 1);
    }

    #[test]
    fn disconnect_clears_connection() {
        let host = MemoryHost::new();
        let id = IdentityId::from(9);
        host.connect(id.clone());
        assert!(host.is_connected(&id));

        host.disconnect(&id, "cheat").unwrap();
        assert!(!host.is_connected(&id));
        assert_eq!(host.disconnects(), vec![(id, "cheat".to_string())]);
    }
}
