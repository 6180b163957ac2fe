// # File State Store
//
// File-based implementation of StateStore with crash recovery.
//
// ## Purpose
//
// Persists the local view of managed records across runs. Losing it means
// losing track of which values in a shared record belong to this caller,
// so every write is flushed to disk immediately.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": {
//     "example.com/_acme/TXT": {
//       "id": "example.com/_acme/TXT",
//       "zone": "example.com",
//       "name": "_acme",
//       "record_type": "TXT",
//       "ttl": 300,
//       "href": "https://api.gandi.net/v5/livedns/domains/example.com/records/_acme/TXT",
//       "values": ["token"],
//       "shared": true,
//       "last_updated": "2025-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::config::StateStoreConfig;
use crate::Error;
use crate::traits::state_store::{ManagedRecord, StateStore, StateStoreFactory};

/// State file format version
const STATE_FILE_VERSION: &str = "1.0";

type Records = BTreeMap<String, ManagedRecord>;

/// File-based state store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use livedns_core::state::FileStateStore;
/// use livedns_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/livedns/state.json").await?;
///
///     for record in store.list().await? {
///         println!("{} -> {:?}", record.id, record.values);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

/// Internal state for file-based store
#[derive(Debug)]
struct FileState {
    records: Records,
    dirty: bool,
}

/// Serializable state file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    records: Records,
}

impl FileStateStore {
    /// Create or load a file state store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load existing state file
    /// 3. If it is corrupted, try to load from backup
    /// 4. If both fail, start with empty state
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let records = Self::load_state_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                records,
                dirty: false,
            })),
        })
    }

    /// Load state from file with automatic recovery
    async fn load_state_with_recovery(path: &Path) -> Result<Records, Error> {
        let corruption = match Self::load_state(path).await {
            Ok(records) => {
                tracing::debug!("Loaded state from file: {} records", records.len());
                return Ok(records);
            }
            Err(Error::Json(e)) => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            "State file {} appears corrupted: {}. Attempting recovery from backup.",
            path.display(),
            corruption
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty state.");
            return Ok(Records::new());
        }

        match Self::load_state(&backup_path).await {
            Ok(records) => {
                tracing::info!("Recovered state from backup: {} records", records.len());

                if let Err(restore_err) = Self::restore_from_backup(path, &backup_path).await {
                    tracing::error!("Failed to restore state file from backup: {}", restore_err);
                }

                Ok(records)
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup also unreadable: {}. Starting with empty state.",
                    backup_err
                );
                Ok(Records::new())
            }
        }
    }

    /// Load state from file
    ///
    /// Parse failures are reported as [`Error::Json`], which is what the
    /// recovery path keys on.
    async fn load_state(path: &Path) -> Result<Records, Error> {
        if !path.exists() {
            tracing::debug!("State file does not exist: {}", path.display());
            return Ok(Records::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            ))
        })?;

        let state_file: StateFileFormat = serde_json::from_str(&content)?;

        if state_file.version != STATE_FILE_VERSION {
            tracing::warn!(
                "State file version mismatch: expected {}, got {}. Attempting to load anyway.",
                STATE_FILE_VERSION,
                state_file.version
            );
        }

        Ok(state_file.records)
    }

    /// Write state to file atomically
    async fn write_state(&self) -> Result<(), Error> {
        let mut state_guard = self.state.write().await;

        let state_file = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            records: state_guard.records.clone(),
        };

        let json = serde_json::to_string_pretty(&state_file)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        state_guard.dirty = false;

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    /// Restore state file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored state file from backup");
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, id: &str) -> Result<Option<ManagedRecord>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.records.get(id).cloned())
    }

    async fn put(&self, record: &ManagedRecord) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            state_guard.records.insert(record.id.clone(), record.clone());
            state_guard.dirty = true;
        }

        // Immediate write for durability
        self.write_state().await
    }

    async fn remove(&self, id: &str) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            if state_guard.records.remove(id).is_none() {
                return Ok(());
            }
            state_guard.dirty = true;
        }

        self.write_state().await
    }

    async fn list(&self) -> Result<Vec<ManagedRecord>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.records.values().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty {
            self.write_state().await
        } else {
            Ok(())
        }
    }
}

/// Factory for file state stores
pub struct FileStateStoreFactory;

#[async_trait]
impl StateStoreFactory for FileStateStoreFactory {
    async fn create(&self, config: &StateStoreConfig) -> Result<Box<dyn StateStore>, Error> {
        match config {
            StateStoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(Error::config("State file path cannot be empty"));
                }
                Ok(Box::new(FileStateStore::new(path).await?))
            }
            _ => Err(Error::config("Invalid config for file state store")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::memory::sample_record;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        let record = sample_record("example.com/_acme/TXT", &["token"]);
        store.put(&record).await.unwrap();
        assert!(path.exists());

        // Load new instance and verify persistence
        let store2 = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store2.get("example.com/_acme/TXT").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_file_store_remove_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.put(&sample_record("example.com/www/A", &["1.2.3.4"])).await.unwrap();
        store.remove("example.com/www/A").await.unwrap();

        let store2 = FileStateStore::new(&path).await.unwrap();
        assert!(store2.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.put(&sample_record("example.com/www/A", &["1.2.3.4"])).await.unwrap();

        // Second write creates the backup of the first
        store.put(&sample_record("example.com/www/A", &["1.2.3.5"])).await.unwrap();
        assert!(FileStateStore::backup_path(&path).exists());

        fs::write(&path, b"corrupted json data").await.unwrap();

        let store2 = FileStateStore::new(&path).await.unwrap();
        let recovered = store2.get("example.com/www/A").await.unwrap().unwrap();
        assert_eq!(recovered.values, vec!["1.2.3.4".to_string()]);
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.put(&sample_record("example.com/www/A", &["1.2.3.4"])).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_factory_requires_path() {
        let factory = FileStateStoreFactory;
        let config = StateStoreConfig::File { path: String::new() };
        assert!(factory.create(&config).await.is_err());
        assert!(factory.create(&StateStoreConfig::Memory).await.is_err());
    }
}
