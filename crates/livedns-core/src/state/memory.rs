// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Provides a simple, fast state store that doesn't persist across restarts.
// Useful for testing and one-shot runs.
//
// ## Crash Behavior
//
// - All state is lost on restart/crash
// - The next apply treats every declared record as new: exclusive records
//   fail to create if they already exist remotely, shared records merge
//   into what is there

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::config::StateStoreConfig;
use crate::traits::state_store::{ManagedRecord, StateStore, StateStoreFactory};
use crate::Error;

/// In-memory state store implementation
///
/// This implementation stores all state in a HashMap protected by a RwLock.
/// It provides no persistence across restarts.
#[derive(Debug, Clone)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<HashMap<String, ManagedRecord>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, id: &str) -> Result<Option<ManagedRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn put(&self, record: &ManagedRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ManagedRecord>, Error> {
        let guard = self.inner.read().await;
        let mut records: Vec<ManagedRecord> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}

/// Factory for in-memory state stores
pub struct MemoryStateStoreFactory;

#[async_trait]
impl StateStoreFactory for MemoryStateStoreFactory {
    async fn create(&self, config: &StateStoreConfig) -> Result<Box<dyn StateStore>, Error> {
        match config {
            StateStoreConfig::Memory => Ok(Box::new(MemoryStateStore::new())),
            _ => Err(Error::config("Invalid config for memory state store")),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_record(id: &str, values: &[&str]) -> ManagedRecord {
    let key: crate::identity::RecordKey = id.parse().unwrap();
    ManagedRecord {
        id: id.to_string(),
        zone: key.zone,
        name: key.name,
        record_type: key.record_type,
        ttl: 300,
        href: format!("memory://{}", id),
        values: values.iter().map(|v| v.to_string()).collect(),
        shared: false,
        last_updated: chrono::Utc::now(),
    }
}
