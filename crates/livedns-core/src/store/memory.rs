// # Memory Record Store
//
// In-process implementation of RecordStore.
//
// ## Purpose
//
// Stands in for a remote authoritative store: tests, dry runs against a
// throwaway zone, and embedding the reconciler without network access.
// Clones share the same underlying map, so a test can hand one clone to
// the reconciler and inspect another.
//
// ## Behavior
//
// - `create` on an existing record set fails (like a real store's
//   duplicate-create rejection)
// - `replace_values` and `delete` on a missing record set fail with
//   `Error::NotFound`

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::StoreConfig;
use crate::identity::RecordKey;
use crate::traits::{RecordStore, RecordStoreFactory, RemoteRecord};
use crate::Error;

const STORE_NAME: &str = "memory";

/// In-memory record store implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<HashMap<RecordKey, RemoteRecord>>>,
}

impl MemoryRecordStore {
    /// Create a new empty memory record store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record set, overwriting any existing one
    ///
    /// Bypasses the [`RecordStore`] contract; meant for setting up
    /// records owned by someone else.
    pub async fn insert(&self, key: &RecordKey, ttl: u32, values: Vec<String>) {
        let mut guard = self.inner.write().await;
        guard.insert(key.clone(), Self::record(key, ttl, values));
    }

    /// Current values of a record set, if present
    pub async fn values_of(&self, key: &RecordKey) -> Option<Vec<String>> {
        let guard = self.inner.read().await;
        guard.get(key).map(|record| record.values.clone())
    }

    /// Get the number of record sets in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    fn record(key: &RecordKey, ttl: u32, values: Vec<String>) -> RemoteRecord {
        RemoteRecord {
            name: key.name.clone(),
            record_type: key.record_type.clone(),
            ttl,
            href: format!("{}://{}", STORE_NAME, key),
            values,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch(&self, key: &RecordKey) -> Result<RemoteRecord, Error> {
        let guard = self.inner.read().await;
        guard
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(key.to_string()))
    }

    async fn create(
        &self,
        key: &RecordKey,
        ttl: u32,
        values: &[String],
    ) -> Result<RemoteRecord, Error> {
        let mut guard = self.inner.write().await;
        if guard.contains_key(key) {
            return Err(Error::provider(
                STORE_NAME,
                format!("Record {} already exists", key),
            ));
        }
        let record = Self::record(key, ttl, values.to_vec());
        guard.insert(key.clone(), record.clone());
        Ok(record)
    }

    async fn replace_values(
        &self,
        key: &RecordKey,
        ttl: u32,
        values: &[String],
    ) -> Result<RemoteRecord, Error> {
        let mut guard = self.inner.write().await;
        let record = guard
            .get_mut(key)
            .ok_or_else(|| Error::not_found(key.to_string()))?;
        record.ttl = ttl;
        record.values = values.to_vec();
        Ok(record.clone())
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(key.to_string()))
    }

    fn store_name(&self) -> &'static str {
        STORE_NAME
    }
}

/// Factory for in-memory record stores
///
/// Every call hands out a fresh, empty store.
pub struct MemoryRecordStoreFactory;

impl RecordStoreFactory for MemoryRecordStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>, Error> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryRecordStore::new())),
            _ => Err(Error::config("Invalid config for memory record store")),
        }
    }
}
