//! A JSON file acting as the host's local ban list.

use bansync_core::{IdentityId, IdentityRecord, RecordSet};
use bansync_engine::{BanHost, SyncError, SyncResult};
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Local ban list stored as a JSON array of records.
///
/// The file is re-read on every call so edits made by other tools are
/// picked up. A missing file is an empty list. The CLI has no live
/// sessions, so nobody is ever connected.
#[derive(Debug)]
pub struct BanFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl BanFile {
    /// Uses the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> SyncResult<RecordSet> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RecordSet::new()),
            Err(e) => return Err(host_error(&self.path, e)),
        };
        let records: Vec<IdentityRecord> =
            serde_json::from_str(&text).map_err(|e| host_error(&self.path, e))?;
        Ok(records.into_iter().collect())
    }

    fn store(&self, bans: &RecordSet) -> SyncResult<()> {
        let json = serde_json::to_string_pretty(&bans.to_sorted_vec())
            .map_err(|e| host_error(&self.path, e))?;
        std::fs::write(&self.path, json).map_err(|e| host_error(&self.path, e))
    }

    fn update(&self, f: impl FnOnce(&mut RecordSet)) -> SyncResult<()> {
        let _guard = self.write_lock.lock();
        let mut bans = self.load()?;
        f(&mut bans);
        self.store(&bans)
    }
}

fn host_error(path: &Path, err: impl std::fmt::Display) -> SyncError {
    SyncError::host(format!("{}: {err}", path.display()))
}

impl BanHost for BanFile {
    fn list_banned(&self) -> SyncResult<Vec<IdentityRecord>> {
        Ok(self.load()?.to_sorted_vec())
    }

    fn ban(&self, record: &IdentityRecord) -> SyncResult<()> {
        self.update(|bans| {
            bans.insert(record.clone());
        })
    }

    fn unban(&self, id: &IdentityId) -> SyncResult<()> {
        self.update(|bans| {
            bans.remove(id);
        })
    }

    fn is_connected(&self, _id: &IdentityId) -> bool {
        false
    }

    fn disconnect(&self, id: &IdentityId, message: &str) -> SyncResult<()> {
        info!(%id, reason = message, "disconnect requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = BanFile::new(dir.path().join("bans.json"));
        assert!(file.list_banned().unwrap().is_empty());
    }

    #[test]
    fn ban_and_unban_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bans.json");
        let file = BanFile::new(&path);

        file.ban(&IdentityRecord::new(2u64, "b", "spam")).unwrap();
        file.ban(&IdentityRecord::new(1u64, "a", "it's \"quoted\"")).unwrap();
        file.unban(&IdentityId::from(2)).unwrap();

        let reopened = BanFile::new(&path);
        assert_eq!(
            reopened.list_banned().unwrap(),
            vec![IdentityRecord::new(1u64, "a", "it's \"quoted\"")]
        );
    }

    #[test]
    fn corrupt_file_is_host_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bans.json");
        std::fs::write(&path, "[{").unwrap();

        let err = BanFile::new(&path).list_banned().unwrap_err();
        assert!(matches!(err, SyncError::Host(_)));
        assert!(!err.is_fatal());
    }
}
