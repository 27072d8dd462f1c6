//! Identity records and record sets.

use crate::identity::IdentityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// One banned identity.
///
/// Equality and hashing cover `(id, name)` only. Two records that differ
/// only in `reason` are equal, so a reason edit never shows up as a diff.
/// Persistence keys on `id` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Natural key.
    pub id: IdentityId,
    /// Display name at the time of the ban.
    pub name: String,
    /// Ban reason, shown to the identity when it is disconnected.
    pub reason: String,
}

impl IdentityRecord {
    /// Creates a new record.
    pub fn new(id: impl Into<IdentityId>, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if every field, including the reason, matches.
    #[must_use]
    pub fn same_details(&self, other: &Self) -> bool {
        self == other && self.reason == other.reason
    }
}

impl PartialEq for IdentityRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl Eq for IdentityRecord {}

impl Hash for IdentityRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
    }
}

/// A collection of records holding at most one record per id.
///
/// Inserting a record whose id is already present replaces the previous
/// record (last write wins), including when built from an iterator.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: HashMap<IdentityId, IdentityRecord>,
}

impl RecordSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record stored for `id`.
    #[must_use]
    pub fn get(&self, id: &IdentityId) -> Option<&IdentityRecord> {
        self.records.get(id)
    }

    /// Returns true if a record with `id` exists, whatever its name.
    #[must_use]
    pub fn contains_id(&self, id: &IdentityId) -> bool {
        self.records.contains_key(id)
    }

    /// Returns true if an equal record (same id and name) exists.
    #[must_use]
    pub fn contains(&self, record: &IdentityRecord) -> bool {
        self.records
            .get(&record.id)
            .is_some_and(|existing| existing == record)
    }

    /// Inserts a record, returning the one it replaced.
    pub fn insert(&mut self, record: IdentityRecord) -> Option<IdentityRecord> {
        self.records.insert(record.id.clone(), record)
    }

    /// Removes the record for `id`.
    pub fn remove(&mut self, id: &IdentityId) -> Option<IdentityRecord> {
        self.records.remove(id)
    }

    /// Iterates over the records in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &IdentityRecord> {
        self.records.values()
    }

    /// Returns the records sorted by id.
    #[must_use]
    pub fn to_sorted_vec(&self) -> Vec<IdentityRecord> {
        let mut records: Vec<IdentityRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}

impl PartialEq for RecordSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|record| other.contains(record))
    }
}

impl Eq for RecordSet {}

impl FromIterator<IdentityRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = IdentityRecord>>(iter: I) -> Self {
        let mut set = RecordSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<IdentityRecord> for RecordSet {
    fn extend<I: IntoIterator<Item = IdentityRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl IntoIterator for RecordSet {
    type Item = IdentityRecord;
    type IntoIter = std::collections::hash_map::IntoValues<IdentityId, IdentityRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}
