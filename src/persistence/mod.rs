//! Best-effort JSON documents on top of a [`PersistenceStore`]
//!
//! Stats, achievements and high scores are small JSON documents, one per key.
//! Reads fall back to `None` on missing or corrupt data and writes never fail
//! the caller: problems are logged and the game carries on.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::platform::PersistenceStore;

/// Read and decode the document under `key`
pub fn load_json<T: DeserializeOwned>(store: &dyn PersistenceStore, key: &str) -> Option<T> {
    let json = store.get(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding corrupt {key}: {e}");
            None
        }
    }
}

/// Encode and write `value` under `key`; returns whether it was stored
pub fn save_json<T: Serialize>(store: &mut dyn PersistenceStore, key: &str, value: &T) -> bool {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Could not encode {key}: {e}");
            return false;
        }
    };
    match store.set(key, &json) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not save {key}: {e}");
            false
        }
    }
}
