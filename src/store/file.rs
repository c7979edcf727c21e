//! File-based state storage.
//!
//! Stores each key as a JSON file in a directory.

use std::path::PathBuf;

use async_trait::async_trait;

use super::StateStore;
use crate::AdminError;

/// File-based state storage.
///
/// Each key is stored as `{key}.json` in the configured directory. Keys are
/// restricted to ASCII alphanumerics, `_` and `-`; anything else is rejected
/// to prevent path traversal.
///
/// # Example
///
/// ```rust,ignore
/// use wicket::FileStateStore;
///
/// let store = FileStateStore::new("/var/lib/myapp/admin")?;
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    directory: PathBuf,
}

fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl FileStateStore {
    /// Creates a new file state store.
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, AdminError> {
        let dir = directory.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            AdminError::StorageError(format!("Failed to create state directory: {e}"))
        })?;
        Ok(Self { directory: dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn read(&self, key: &str) -> Result<Option<String>, AdminError> {
        if !valid_key(key) {
            return Ok(None);
        }

        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| AdminError::StorageError(format!("Failed to read state file: {e}")))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AdminError> {
        if !valid_key(key) {
            return Err(AdminError::StorageError(format!(
                "Invalid storage key: {key:?}"
            )));
        }

        std::fs::write(self.key_path(key), value)
            .map_err(|e| AdminError::StorageError(format!("Failed to write state file: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<(), AdminError> {
        if !valid_key(key) {
            return Ok(());
        }

        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                AdminError::StorageError(format!("Failed to delete state file: {e}"))
            })?;
        }

        Ok(())
    }
}
