//! Benchmark utilities.

#![warn(missing_docs)]

use bansync_core::{IdentityId, IdentityRecord, RecordSet};

/// Generates `count` numeric-id records starting at `first`.
pub fn numeric_records(first: u64, count: usize) -> Vec<IdentityRecord> {
    (first..first + count as u64)
        .map(|id| IdentityRecord::new(id, format!("player_{id}"), "griefing"))
        .collect()
}

/// Generates `count` textual-id records in mixed case.
pub fn text_records(count: usize) -> Vec<IdentityRecord> {
    (0..count)
        .map(|i| {
            let id = if i % 2 == 0 {
                format!("Player{i}")
            } else {
                format!("PLAYER{i}")
            };
            IdentityRecord::new(IdentityId::Text(id), format!("name_{i}"), "spam")
        })
        .collect()
}

/// Builds an old/new pair where `churn` percent of the records differ.
///
/// Half of the churn is removals replaced by new ids, half is renames.
pub fn churned_pair(count: usize, churn: usize) -> (RecordSet, RecordSet) {
    let old: RecordSet = numeric_records(0, count).into_iter().collect();
    let changed = count * churn / 100;

    let mut new = old.clone();
    for id in 0..(changed / 2) as u64 {
        new.remove(&IdentityId::from(id));
    }
    new.extend(numeric_records(count as u64, changed / 2));
    for id in (changed / 2) as u64..changed as u64 {
        new.insert(IdentityRecord::new(id, format!("renamed_{id}"), "griefing"));
    }
    (old, new)
}
