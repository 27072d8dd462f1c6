//! Ban and unban command implementations.
//!
//! Each invocation builds a fresh engine, so both commands reconcile with
//! the shared table first. The bridge only writes once bootstrap is done.

use super::open_engine;
use crate::ban_file::BanFile;
use bansync_core::{IdentityId, IdentityRecord};
use bansync_engine::{BanHost, BridgeOutcome, SyncEngine};
use std::path::Path;

fn reconciled_engine(
    config_path: &Path,
    bans_path: &Path,
) -> Result<SyncEngine<BanFile>, Box<dyn std::error::Error>> {
    let engine = open_engine(config_path, bans_path)?;
    engine.tick()?;
    Ok(engine)
}

/// Bans an identity in the local file, then bridges it to the shared table.
pub fn ban(
    config_path: &Path,
    bans_path: &Path,
    id: IdentityId,
    name: String,
    reason: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = reconciled_engine(config_path, bans_path)?;
    let record = IdentityRecord::new(id, name, reason);

    engine.host().ban(&record)?;
    match engine.on_banned(&record)? {
        BridgeOutcome::Written => println!("Banned {} ({})", record.id, record.name),
        BridgeOutcome::AlreadySynced => println!("{} was already banned", record.id),
        BridgeOutcome::Deferred => {
            println!("Banned {} locally; it is pushed on the next sync", record.id)
        }
    }
    Ok(())
}

/// Lifts a ban in the local file, then bridges it to the shared table.
pub fn unban(
    config_path: &Path,
    bans_path: &Path,
    id: &IdentityId,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = reconciled_engine(config_path, bans_path)?;

    engine.host().unban(id)?;
    match engine.on_unbanned(id)? {
        BridgeOutcome::Written => println!("Unbanned {id}"),
        BridgeOutcome::AlreadySynced => println!("{id} was not banned"),
        BridgeOutcome::Deferred => println!("Unbanned {id} locally; it is pushed on the next sync"),
    }
    Ok(())
}
