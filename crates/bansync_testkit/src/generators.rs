//! Property-based test generators using proptest.

use bansync_core::{IdentityId, IdentityRecord, RecordSet};
use proptest::prelude::*;

/// Strategy for identity ids: mostly numeric, some textual in mixed case.
pub fn identity_id_strategy() -> impl Strategy<Value = IdentityId> {
    prop_oneof![
        3 => (0u64..64).prop_map(IdentityId::from),
        1 => prop::string::string_regex("[a-zA-Z][a-zA-Z_]{0,5}")
            .expect("Invalid regex")
            .prop_map(IdentityId::Text),
    ]
}

/// Strategy for display names, drawn from a small pool so that collisions
/// on `(id, name)` are common.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["alice", "bob", "carol", "dave", "Alice", "it's"])
        .prop_map(str::to_string)
}

/// Strategy for ban reasons, including quotes and empty strings.
pub fn reason_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z '\"]{0,12}").expect("Invalid regex")
}

/// Strategy for a single record.
pub fn record_strategy() -> impl Strategy<Value = IdentityRecord> {
    (identity_id_strategy(), name_strategy(), reason_strategy())
        .prop_map(|(id, name, reason)| IdentityRecord::new(id, name, reason))
}

/// Strategy for a list of records, possibly repeating ids.
pub fn record_vec_strategy(max_len: usize) -> impl Strategy<Value = Vec<IdentityRecord>> {
    prop::collection::vec(record_strategy(), 0..=max_len)
}

/// Strategy for a record set.
pub fn record_set_strategy(max_len: usize) -> impl Strategy<Value = RecordSet> {
    record_vec_strategy(max_len).prop_map(|records| records.into_iter().collect())
}
