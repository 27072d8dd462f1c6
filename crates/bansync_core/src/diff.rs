//! Set difference between two record sets.

use crate::identity::IdentityId;
use crate::record::{IdentityRecord, RecordSet};
use std::collections::HashSet;

/// Records added and removed when going from one set to another.
///
/// Both sides are computed independently: a record whose name changed shows
/// up once in `removed` (old name) and once in `added` (new name). Both
/// vectors are sorted by id, so the result does not depend on input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanDiff {
    /// Records present in the new set but not the old one.
    pub added: Vec<IdentityRecord>,
    /// Records present in the old set but not the new one.
    pub removed: Vec<IdentityRecord>,
}

impl BanDiff {
    /// Computes the difference from `old` to `new`.
    ///
    /// Runs in linear time: each side probes the other's id index and then
    /// compares names.
    #[must_use]
    pub fn between(old: &RecordSet, new: &RecordSet) -> Self {
        let mut added: Vec<IdentityRecord> = new
            .iter()
            .filter(|record| !old.contains(record))
            .cloned()
            .collect();
        let mut removed: Vec<IdentityRecord> = old
            .iter()
            .filter(|record| !new.contains(record))
            .cloned()
            .collect();

        added.sort_by(|a, b| a.id.cmp(&b.id));
        removed.sort_by(|a, b| a.id.cmp(&b.id));

        Self { added, removed }
    }

    /// Returns true if nothing was added or removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Total number of changed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    /// Removed records whose id does not come back in `added`.
    ///
    /// A renamed identity appears on both sides; deleting its id after the
    /// re-add would drop the new record, so callers delete only these.
    pub fn removed_not_readded(&self) -> impl Iterator<Item = &IdentityRecord> {
        let readded: HashSet<&IdentityId> = self.added.iter().map(|r| &r.id).collect();
        self.removed
            .iter()
            .filter(move |record| !readded.contains(&record.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(records: &[(u64, &str, &str)]) -> RecordSet {
        records
            .iter()
            .map(|(id, name, reason)| IdentityRecord::new(*id, *name, *reason))
            .collect()
    }

    #[test]
    fn identical_sets_have_empty_diff() {
        let a = set(&[(1, "a", "r1"), (2, "b", "r2")]);
        let diff = BanDiff::between(&a, &a);
        assert!(diff.is_empty());
        assert_eq!(diff.len(), 0);
    }

    #[test]
    fn detects_additions_and_removals() {
        let old = set(&[(1, "a", "r1"), (2, "b", "r2")]);
        let new = set(&[(2, "b", "r2"), (3, "c", "r3")]);

        let diff = BanDiff::between(&old, &new);
        assert_eq!(diff.added, vec![IdentityRecord::new(3u64, "c", "r3")]);
        assert_eq!(diff.removed, vec![IdentityRecord::new(1u64, "a", "r1")]);
    }

    #[test]
    fn rename_is_remove_plus_add() {
        let old = set(&[(7, "old", "r")]);
        let new = set(&[(7, "new", "r")]);

        let diff = BanDiff::between(&old, &new);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed_not_readded().count(), 0);
    }

    #[test]
    fn reason_change_is_not_a_diff() {
        let old = set(&[(7, "x", "spam")]);
        let new = set(&[(7, "x", "spam and cheating")]);
        assert!(BanDiff::between(&old, &new).is_empty());
    }

    #[test]
    fn swapping_arguments_swaps_sides() {
        let a = set(&[(1, "a", ""), (2, "b", "")]);
        let b = set(&[(2, "bb", ""), (3, "c", "")]);

        let forward = BanDiff::between(&a, &b);
        let backward = BanDiff::between(&b, &a);
        assert_eq!(forward.added, backward.removed);
        assert_eq!(forward.removed, backward.added);
    }

    #[test]
    fn output_is_sorted() {
        let old = RecordSet::new();
        let new = set(&[(30, "c", ""), (10, "a", ""), (20, "b", "")]);
        let ids: Vec<u64> = BanDiff::between(&old, &new)
            .added
            .iter()
            .filter_map(|r| r.id.as_u64())
            .collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}
