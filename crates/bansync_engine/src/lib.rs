//! # Bansync Engine
//!
//! Keeps a host's local ban list consistent with a shared `userbans` table.
//!
//! This crate provides:
//! - Bootstrap (create and seed the table, or reconcile with it)
//! - The pull → apply → push cycle as directly callable phases
//! - The event bridge for immediate single-record writes
//! - A scheduler thread driving the cycle on a fixed delay
//!
//! ## Architecture
//!
//! Each process keeps a *snapshot*: the ban list both sides agreed on at the
//! last reconciliation. Pushing diffs the snapshot against the local list and
//! writes the changes; pulling diffs the snapshot against the shared table
//! and applies the changes locally. The shared table is authoritative.
//! Bridge notifications that arrive before bootstrap are left to the seed or
//! the first pull.
//!
//! ## Key Invariants
//!
//! - One statement per batch; nothing is partially applied
//! - Store handles are opened per phase and closed on every path
//! - Cycles and bridge writes never overlap within a process
//! - A failed statement or malformed row unloads the engine
//!
//! ## Example
//!
//! ```rust
//! use bansync_core::IdentityRecord;
//! use bansync_engine::{MemoryHost, SyncConfig, SyncEngine};
//! use bansync_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new();
//! let host = Arc::new(MemoryHost::with_bans([IdentityRecord::new(1u64, "griefer", "tnt")]));
//! let engine = SyncEngine::new(SyncConfig::default(), Box::new(store.clone()), host).unwrap();
//!
//! engine.tick().unwrap();
//! assert_eq!(store.rows().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod config;
mod engine;
mod error;
mod host;
mod scheduler;
mod state;

pub use bridge::BridgeOutcome;
pub use config::{SyncConfig, DEFAULT_PUSH_DELAY};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use host::{BanHost, MemoryHost};
pub use scheduler::SyncScheduler;
pub use state::{ApplyReport, CycleReport, SyncState, SyncStats};
