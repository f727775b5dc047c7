//! Typed JSON values over a [`KeyValueStore`].

use crate::storage::KeyValueStore;
use plaza_core::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// JSON-encoding wrapper around a key-value store.
#[derive(Clone)]
pub struct LocalStorage {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorage").finish_non_exhaustive()
    }
}

impl LocalStorage {
    /// Wrap `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Decode the value under `key`.
    ///
    /// Missing, unreadable and malformed entries all read as `None`; the
    /// last two are logged.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not read local storage");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding malformed local storage entry");
                None
            }
        }
    }

    /// Encode and store `value` under `key`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw).await
    }

    /// Remove `key`.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(key).await.map(|_| ())
    }
}
