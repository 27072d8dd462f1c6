//! Run command implementation.

use super::open_engine;
use bansync_engine::SyncScheduler;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::error;

/// Runs the sync loop until the engine unloads.
pub fn run(config_path: &Path, bans_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Arc::new(open_engine(config_path, bans_path)?);
    let scheduler = SyncScheduler::start(Arc::clone(&engine))?;

    while !scheduler.is_finished() {
        thread::sleep(Duration::from_millis(500));
    }
    scheduler.join();

    let stats = engine.stats();
    if let Some(last_error) = stats.last_error {
        error!(cycles = stats.cycles_completed, "ban sync stopped: {last_error}");
        return Err(last_error.into());
    }
    Ok(())
}
