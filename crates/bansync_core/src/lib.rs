//! # bansync core
//!
//! Value types and the diff engine shared by every bansync crate.
//!
//! This crate provides:
//! - [`IdentityId`] - natural key of a banned identity (numeric or textual)
//! - [`IdentityRecord`] - one banned identity with display name and reason
//! - [`RecordSet`] - a collection holding at most one record per id
//! - [`BanDiff`] - added/removed records between two record sets
//!
//! ## Equality
//!
//! Records compare equal when their ids match (numeric ids by value, textual
//! ids ignoring ASCII case) and their names match exactly. The reason is not
//! part of equality, so editing a ban reason never causes an unban/re-ban.
//!
//! ## Example
//!
//! ```rust
//! use bansync_core::{BanDiff, IdentityRecord, RecordSet};
//!
//! let old: RecordSet = [IdentityRecord::new(5u64, "x", "spam")].into_iter().collect();
//! let new: RecordSet = [
//!     IdentityRecord::new(5u64, "x", "spam"),
//!     IdentityRecord::new(9u64, "y", "cheat"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let diff = BanDiff::between(&old, &new);
//! assert_eq!(diff.added.len(), 1);
//! assert!(diff.removed.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod diff;
mod error;
mod identity;
mod record;

pub use diff::BanDiff;
pub use error::{IdentityError, IdentityResult};
pub use identity::IdentityId;
pub use record::{IdentityRecord, RecordSet};

/// Name of the shared table every backend stores bans in.
pub const BAN_TABLE: &str = "userbans";
