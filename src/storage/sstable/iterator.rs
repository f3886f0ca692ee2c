//! SSTable Iterator
//!
//! Sequential iteration over all entries in an SSTable.

use std::collections::HashMap;
use std::slice;

use crate::entry::Entry;
use crate::error::{LsmError, Result};

use super::Position;

/// Iterator over SSTable entries in sorted key order
///
/// Walks the sorted key list over a copy of the data region, so the file
/// lock is released before iteration starts.
pub struct SSTableIterator<'a> {
    data: Vec<u8>,
    keys: slice::Iter<'a, String>,
    index: &'a HashMap<String, Position>,
}

impl<'a> SSTableIterator<'a> {
    pub(super) fn new(
        data: Vec<u8>,
        keys: &'a [String],
        index: &'a HashMap<String, Position>,
    ) -> Self {
        Self {
            data,
            keys: keys.iter(),
            index,
        }
    }
}

impl<'a> Iterator for SSTableIterator<'a> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        let position = match self.index.get(key) {
            Some(position) => position,
            None => {
                return Some(Err(LsmError::CorruptTable(format!(
                    "key {:?} missing from index",
                    key
                ))))
            }
        };

        if position.deleted {
            return Some(Ok(Entry::tombstone(key.clone())));
        }

        let start = position.start as usize;
        let end = start + position.len as usize;
        let entry = Entry::decode(&self.data[start..end]).map_err(|e| {
            LsmError::CorruptTable(format!("undecodable entry for {:?}: {}", key, e))
        });
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}
