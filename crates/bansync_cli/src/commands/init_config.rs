//! Init-config command implementation.

use bansync_engine::SyncConfig;
use std::path::Path;

/// Runs the init-config command.
pub fn run(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }

    let config = SyncConfig::default();
    config.save(path)?;
    println!("Wrote default configuration to {}", path.display());
    println!("  Backend:    {}", config.store.backend);
    println!("  Push delay: {:?}", config.push_delay());
    Ok(())
}
