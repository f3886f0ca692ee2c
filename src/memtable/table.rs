//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::{btree_map, BTreeMap};

use parking_lot::RwLock;

use crate::entry::{Entry, Lookup};

/// In-memory table for recent writes
///
/// ## Concurrency:
/// - `get`/`count`/`export_sorted` take the shared lock
/// - `set`/`delete`/`swap` take the exclusive lock
pub struct MemTable {
    data: RwLock<BTreeMap<String, Entry>>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Build a MemTable that takes ownership of an existing map
    fn from_map(map: BTreeMap<String, Entry>) -> Self {
        Self {
            data: RwLock::new(map),
        }
    }

    /// Look up a key (read lock)
    pub fn get(&self, key: &str) -> Lookup {
        let data = self.data.read();
        match data.get(key) {
            Some(entry) if entry.deleted => Lookup::Deleted,
            Some(entry) => Lookup::Found(entry.clone()),
            None => Lookup::NotFound,
        }
    }

    /// Insert or overwrite a key (write lock)
    ///
    /// Returns the previous live entry. A previous tombstone is not reported.
    pub fn set(&self, key: impl Into<String>, value: Vec<u8>) -> Option<Entry> {
        let entry = Entry::live(key, value);
        let mut data = self.data.write();
        data.insert(entry.key.clone(), entry)
            .filter(|previous| !previous.deleted)
    }

    /// Delete a key (write lock, inserts tombstone)
    ///
    /// - live entry: replaced by a tombstone, previous entry returned
    /// - no entry: a tombstone is still recorded so older tables stay shadowed
    /// - tombstone: no-op
    pub fn delete(&self, key: impl Into<String>) -> Option<Entry> {
        let mut data = self.data.write();
        match data.entry(key.into()) {
            btree_map::Entry::Occupied(slot) if slot.get().deleted => None,
            btree_map::Entry::Occupied(mut slot) => {
                let tombstone = Entry::tombstone(slot.key().clone());
                Some(slot.insert(tombstone))
            }
            btree_map::Entry::Vacant(slot) => {
                let tombstone = Entry::tombstone(slot.key().clone());
                slot.insert(tombstone);
                None
            }
        }
    }

    /// Apply a record: tombstones become deletes, live entries become sets
    pub fn apply(&self, entry: Entry) {
        if entry.deleted {
            self.delete(entry.key);
        } else {
            let Entry { key, value, .. } = entry;
            self.set(key, value.unwrap_or_default());
        }
    }

    /// Number of distinct keys tracked, live and tombstoned
    pub fn count(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the memtable has no entries
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Detach the current contents, leaving this table empty
    ///
    /// Runs under the exclusive lock so no writer observes a half-swapped table.
    pub fn swap(&self) -> MemTable {
        let mut data = self.data.write();
        MemTable::from_map(std::mem::take(&mut *data))
    }

    /// All entries in ascending key order
    pub fn export_sorted(&self) -> Vec<Entry> {
        self.data.read().values().cloned().collect()
    }

    /// Consume the table into its entries in ascending key order
    pub fn into_sorted(self) -> Vec<Entry> {
        self.data.into_inner().into_values().collect()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
