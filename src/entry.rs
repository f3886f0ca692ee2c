//! Entry definitions
//!
//! The record shared by every tier: memtable nodes, WAL records and SSTable
//! data blocks all carry an `Entry`.

use serde::{Deserialize, Serialize};

use crate::error::{LsmError, Result};

/// A single key/value record, or a tombstone for a deleted key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The key; keys order by byte-wise comparison
    pub key: String,

    /// The value bytes, `None` for a tombstone
    pub value: Option<Vec<u8>>,

    /// Tombstone flag
    pub deleted: bool,
}

impl Entry {
    /// Create a live entry
    pub fn live(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            deleted: false,
        }
    }

    /// Create a tombstone
    pub fn tombstone(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            deleted: true,
        }
    }

    /// Value bytes of a live entry (empty slice for a tombstone)
    pub fn value_bytes(&self) -> &[u8] {
        self.value.as_deref().unwrap_or_default()
    }

    /// Serialize to the binary form used in WAL records and SSTable data
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| LsmError::Serialization(e.to_string()))
    }

    /// Deserialize from the binary form produced by [`Entry::encode`]
    ///
    /// Callers map the error to the corruption kind of their tier.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Outcome of a point lookup in any tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The key holds a live value
    Found(Entry),

    /// The newest record for the key is a tombstone
    Deleted,

    /// This tier knows nothing about the key
    NotFound,
}

impl Lookup {
    /// True when the lookup settled the key (live or deleted)
    pub fn is_hit(&self) -> bool {
        !matches!(self, Lookup::NotFound)
    }

    /// Consume into the live value, if any
    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            Lookup::Found(entry) => entry.value,
            Lookup::Deleted | Lookup::NotFound => None,
        }
    }
}
