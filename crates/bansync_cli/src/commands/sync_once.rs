//! Sync-once command implementation.

use super::open_engine;
use std::path::Path;

/// Runs the sync-once command.
///
/// The engine is new, so this always bootstraps with the ban file as the
/// snapshot. Against an existing table that pulls, which lifts any ban the
/// file holds but the table does not.
pub fn run(config_path: &Path, bans_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(config_path, bans_path)?;
    let report = engine.tick()?;

    println!("Sync complete");
    if report.seeded > 0 {
        println!("  Created shared table with {} rows", report.seeded);
    }
    println!("  Remote bans applied:   {}", report.applied.banned);
    println!("  Remote unbans applied: {}", report.applied.unbanned);
    println!("  Local bans:            {}", engine.snapshot().len());
    Ok(())
}
