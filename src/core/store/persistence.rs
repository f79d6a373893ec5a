use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::models::PersistedState;

/// Namespace key of the single persisted record.
pub const STORAGE_KEY: &str = "shele-news-storage";
pub const STORAGE_VERSION: u32 = 0;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored state is not valid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored state has unsupported version {0}")]
    Version(u32),
}

/// Durable key/value storage local to this client.
pub trait StateStorage: Send + Sync {
    fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    state: PersistedState,
    version: u32,
}

pub fn read_state(
    storage: &dyn StateStorage,
    key: &str,
) -> Result<Option<PersistedState>, StorageError> {
    let Some(raw) = storage.get_setting(key)? else {
        return Ok(None);
    };
    let record: StoredRecord = serde_json::from_str(&raw)?;
    if record.version != STORAGE_VERSION {
        return Err(StorageError::Version(record.version));
    }
    Ok(Some(record.state))
}

pub fn write_state(
    storage: &dyn StateStorage,
    key: &str,
    state: &PersistedState,
) -> Result<(), StorageError> {
    let record = StoredRecord {
        state: state.clone(),
        version: STORAGE_VERSION,
    };
    let serialized = serde_json::to_string(&record)?;
    storage.set_setting(key, &serialized)
}

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStorage for FileStorage {
    fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        let mut staging = tempfile::NamedTempFile::new_in(&self.dir)?;
        staging.write_all(value.as_bytes())?;
        staging.persist(&target).map_err(|error| error.error)?;
        Ok(())
    }
}

/// In-process storage; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        storage
    }
}

impl StateStorage for MemoryStorage {
    fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::models::StoreState;

    #[test]
    fn file_storage_round_trips_state() {
        let dir = tempfile::tempdir().expect("temp dir should exist");
        let storage = FileStorage::new(dir.path().join("nested"));
        let mut state = StoreState::default();
        state.is_dark_mode = true;
        state.filters.language = "fr".to_string();

        write_state(&storage, STORAGE_KEY, &state.persisted()).expect("write should succeed");
        let restored = read_state(&storage, STORAGE_KEY)
            .expect("read should succeed")
            .expect("record should exist");

        assert_eq!(restored, state.persisted());
        assert!(dir.path().join("nested/shele-news-storage.json").exists());
        assert!(!dir.path().join("nested/shele-news-storage.json.tmp").exists());
    }

    #[test]
    fn overwrites_replace_the_file_without_leftovers() {
        let dir = tempfile::tempdir().expect("temp dir should exist");
        let storage = FileStorage::new(dir.path());
        storage
            .set_setting(STORAGE_KEY, "first")
            .expect("first write should succeed");
        storage
            .set_setting(STORAGE_KEY, "second")
            .expect("second write should succeed");

        assert_eq!(
            storage.get_setting(STORAGE_KEY).expect("read should succeed"),
            Some("second".to_string())
        );
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .expect("dir should list")
            .map(|entry| entry.expect("entry should read").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("shele-news-storage.json")]);
    }

    #[test]
    fn write_into_a_file_path_fails_with_io_error() {
        let dir = tempfile::tempdir().expect("temp dir should exist");
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, "not a directory").expect("blocker should be written");
        let storage = FileStorage::new(&blocker);
        assert!(matches!(
            storage.set_setting(STORAGE_KEY, "{}"),
            Err(StorageError::Io(_))
        ));
    }

    #[test]
    fn missing_record_reads_as_none() {
        let dir = tempfile::tempdir().expect("temp dir should exist");
        let storage = FileStorage::new(dir.path());
        assert!(read_state(&storage, STORAGE_KEY)
            .expect("read should succeed")
            .is_none());
    }

    #[test]
    fn malformed_and_foreign_versions_are_errors() {
        let garbage = MemoryStorage::with_item(STORAGE_KEY, "{not json");
        assert!(matches!(
            read_state(&garbage, STORAGE_KEY),
            Err(StorageError::Json(_))
        ));

        let future = MemoryStorage::with_item(
            STORAGE_KEY,
            r#"{"state":{"bookmarks":[],"isDarkMode":true,"filters":{"country":"de","language":"de"}},"version":7}"#,
        );
        assert!(matches!(
            read_state(&future, STORAGE_KEY),
            Err(StorageError::Version(7))
        ));
    }
}
