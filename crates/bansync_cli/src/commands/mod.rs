//! CLI command implementations.

pub mod ban;
pub mod dump;
pub mod init_config;
pub mod run;
pub mod sync_once;

use crate::ban_file::BanFile;
use bansync_engine::{SyncConfig, SyncEngine};
use std::path::Path;
use std::sync::Arc;

/// Loads the configuration and builds an engine over the ban file.
pub fn open_engine(
    config_path: &Path,
    bans_path: &Path,
) -> Result<SyncEngine<BanFile>, Box<dyn std::error::Error>> {
    let config = SyncConfig::load_or_init(config_path)?;
    let connector = config.store.connector();
    let host = Arc::new(BanFile::new(bans_path));
    Ok(SyncEngine::new(config, connector, host)?)
}
