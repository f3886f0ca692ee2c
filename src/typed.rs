//! Typed access
//!
//! Serde-typed wrappers over the byte-oriented engine API. Values are
//! encoded with bincode before they reach the engine; the core never sees
//! anything but bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::engine::Engine;
use crate::error::{LsmError, Result};

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| LsmError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| LsmError::Serialization(e.to_string()))
}

impl Engine {
    /// Encode `value` and store it under `key`
    ///
    /// Returns whether the memtable held a previous live value.
    pub fn set_typed<T: Serialize>(&self, key: &str, value: &T) -> Result<bool> {
        let bytes = encode(value)?;
        Ok(self.set(key, &bytes)?.is_some())
    }

    /// Fetch and decode the value under `key`
    ///
    /// `Ok(None)` when the key is absent or deleted.
    pub fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_value(key)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Delete `key` and decode its previous live memtable value, if any
    pub fn delete_and_get_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.delete_and_get(key)? {
            Some(previous) => decode(previous.value_bytes()).map(Some),
            None => Ok(None),
        }
    }
}
