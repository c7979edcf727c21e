//! In-memory state storage.
//!
//! Suitable for tests and hosts that do not need state to survive restarts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::StateStore;
use crate::AdminError;

/// In-memory state storage.
///
/// Stores blobs in a `HashMap` protected by a `RwLock`. Cloning shares the
/// underlying map, so a clone kept by a test observes the manager's writes.
///
/// # Note
///
/// State is lost when the process exits. For persistence across restarts,
/// use [`FileStateStore`](super::FileStateStore).
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStateStore {
    /// Creates a new in-memory state store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns true if there are no keys stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn read(&self, key: &str) -> Result<Option<String>, AdminError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AdminError::StorageError("Lock poisoned".to_owned()))?;

        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AdminError> {
        self.entries
            .write()
            .map_err(|_| AdminError::StorageError("Lock poisoned".to_owned()))?
            .insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AdminError> {
        self.entries
            .write()
            .map_err(|_| AdminError::StorageError("Lock poisoned".to_owned()))?
            .remove(key);

        Ok(())
    }
}
