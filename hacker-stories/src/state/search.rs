//! Search term that survives restarts

use anyhow::Result;
use tracing::debug;

use crate::persistence::KeyValueStore;

/// Store key the search term is saved under
pub const SEARCH_KEY: &str = "search";

/// Term used when nothing has been stored yet
pub const DEFAULT_SEARCH: &str = "React";

/// A string value backed by a key-value store.
///
/// The value is read once when loaded. Afterwards every change is written
/// back; the loaded value itself and repeated identical values are not.
pub struct SearchState {
    key: String,
    value: String,
    store: Box<dyn KeyValueStore>,
}

impl SearchState {
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        Self::load_with(store, SEARCH_KEY, DEFAULT_SEARCH)
    }

    pub fn load_with(store: Box<dyn KeyValueStore>, key: &str, default: &str) -> Self {
        let value = match store.get(key) {
            Some(stored) if !stored.is_empty() => stored,
            _ => default.to_string(),
        };
        debug!(target: "search", "Restored '{}' = '{}'", key, value);

        Self {
            key: key.to_string(),
            value,
            store,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Update the term. Returns whether it changed.
    ///
    /// The in-memory value is updated even if the store write fails.
    pub fn set(&mut self, value: impl Into<String>) -> Result<bool> {
        let value = value.into();
        if value == self.value {
            return Ok(false);
        }

        self.value = value;
        debug!(target: "search", "Persisting '{}' = '{}'", self.key, self.value);
        self.store.set(&self.key, &self.value)?;
        Ok(true)
    }

    /// A submit is only possible with a non-blank term
    pub fn can_submit(&self) -> bool {
        !self.value.trim().is_empty()
    }
}
