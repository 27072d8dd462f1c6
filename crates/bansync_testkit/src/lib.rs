//! # Bansync Testkit
//!
//! Test utilities for bansync.
//!
//! This crate provides:
//! - A throwaway SQLite store in a temporary directory
//! - Record-building helpers
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use bansync_testkit::prelude::*;
//!
//! let store = TempSqlite::new();
//! store.seed(&records(&[(1, "a", "r1"), (2, "b", "r2")]));
//! assert_eq!(store.rows().len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
