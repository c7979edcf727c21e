//! Persisted key/value state.
//!
//! The manager keeps two records in a [`StateStore`]: the active session and
//! the lockout record, each under its own configurable key. Implementations
//! provide different storage backends:
//! - [`InMemoryStateStore`]: in-memory storage for testing and ephemeral hosts
//! - [`FileStateStore`]: one JSON file per key
//!
//! The store is shared mutable state with no cross-context locking. Two
//! processes (or browser-like contexts) pointed at the same backing storage
//! follow last-writer-wins semantics; each manager's in-memory copy can
//! diverge from storage until its own next read.

mod file;
mod memory;

pub use file::FileStateStore;
pub use memory::InMemoryStateStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::AdminError;

/// Key/value storage of JSON-serialized records.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads the raw blob stored under `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<String>, AdminError>;

    /// Writes a blob under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: &str) -> Result<(), AdminError>;

    /// Deletes the blob under `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AdminError>;
}

/// Reads and deserializes the record under `key`.
///
/// A blob that fails to parse is treated as absent: the key is cleared, a
/// warning is logged and `Ok(None)` is returned. Corruption is never
/// surfaced to the caller.
pub(crate) async fn read_record<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> Result<Option<T>, AdminError> {
    let Some(blob) = store.read(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&blob) {
        Ok(record) => Ok(Some(record)),
        Err(err) => {
            log::warn!(
                target: "wicket::store",
                "clearing corrupt record under {key:?}: {err}"
            );
            store.delete(key).await?;
            Ok(None)
        }
    }
}

/// Serializes and writes a record under `key`.
pub(crate) async fn write_record<T: Serialize>(
    store: &dyn StateStore,
    key: &str,
    record: &T,
) -> Result<(), AdminError> {
    let blob = serde_json::to_string(record)
        .map_err(|e| AdminError::StorageError(format!("Failed to serialize record: {e}")))?;
    store.write(key, &blob).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Probe {
        n: u32,
    }

    #[tokio::test]
    async fn test_record_roundtrip() {
        let store = InMemoryStateStore::new();

        write_record(&store, "probe", &Probe { n: 7 }).await.unwrap();
        let read: Option<Probe> = read_record(&store, "probe").await.unwrap();
        assert_eq!(read, Some(Probe { n: 7 }));
    }

    #[tokio::test]
    async fn test_read_record_missing() {
        let store = InMemoryStateStore::new();

        let read: Option<Probe> = read_record(&store, "nope").await.unwrap();
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_cleared() {
        let store = InMemoryStateStore::new();
        store.write("probe", "{not json").await.unwrap();

        let read: Option<Probe> = read_record(&store, "probe").await.unwrap();
        assert!(read.is_none());

        // the corrupted key is gone, not just skipped
        assert!(store.read("probe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_shape_cleared() {
        let store = InMemoryStateStore::new();
        store.write("probe", r#"{"n":"not a number"}"#).await.unwrap();

        let read: Option<Probe> = read_record(&store, "probe").await.unwrap();
        assert!(read.is_none());
        assert!(store.read("probe").await.unwrap().is_none());
    }
}
