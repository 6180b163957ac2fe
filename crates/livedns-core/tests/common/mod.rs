//! Test doubles and common utilities for reconciler contract tests

#![allow(dead_code)]

use async_trait::async_trait;
use livedns_core::config::{LiveDnsConfig, RecordConfig, StateStoreConfig, StoreConfig};
use livedns_core::error::{Error, Result};
use livedns_core::store::MemoryRecordStore;
use livedns_core::traits::{RecordStore, RemoteRecord};
use livedns_core::RecordKey;
use std::sync::{Arc, Mutex};

/// A remote call observed by [`RecordingStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(String),
    Create(String, u32, Vec<String>),
    Replace(String, u32, Vec<String>),
    Delete(String),
}

/// Which operation should fail with an injected error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Fetch,
    Create,
    Replace,
    Delete,
}

/// A RecordStore backed by [`MemoryRecordStore`] that records every call
///
/// Clones share the call log, the failure switch and the records.
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: MemoryRecordStore,
    calls: Arc<Mutex<Vec<Call>>>,
    fail_on: Arc<Mutex<Option<FailOn>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records as seen by the store
    pub fn records(&self) -> &MemoryRecordStore {
        &self.inner
    }

    /// Seed a record owned by somebody else
    pub async fn seed(&self, id: &str, ttl: u32, values: &[&str]) {
        let key: RecordKey = id.parse().unwrap();
        self.inner.insert(&key, ttl, strings(values)).await;
    }

    /// Current remote values of `id`
    pub async fn values(&self, id: &str) -> Option<Vec<String>> {
        let key: RecordKey = id.parse().unwrap();
        self.inner.values_of(&key).await
    }

    /// Make every call of the given kind fail with a transport error
    pub fn fail_on(&self, op: FailOn) {
        *self.fail_on.lock().unwrap() = Some(op);
    }

    /// Stop injecting failures
    pub fn heal(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Calls other than fetches
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Fetch(_)))
            .collect()
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: FailOn) -> Result<()> {
        if *self.fail_on.lock().unwrap() == Some(op) {
            return Err(Error::provider("recording", format!("injected {:?} failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn fetch(&self, key: &RecordKey) -> Result<RemoteRecord> {
        self.log(Call::Fetch(key.to_string()));
        self.check(FailOn::Fetch)?;
        self.inner.fetch(key).await
    }

    async fn create(&self, key: &RecordKey, ttl: u32, values: &[String]) -> Result<RemoteRecord> {
        self.log(Call::Create(key.to_string(), ttl, values.to_vec()));
        self.check(FailOn::Create)?;
        self.inner.create(key, ttl, values).await
    }

    async fn replace_values(
        &self,
        key: &RecordKey,
        ttl: u32,
        values: &[String],
    ) -> Result<RemoteRecord> {
        self.log(Call::Replace(key.to_string(), ttl, values.to_vec()));
        self.check(FailOn::Replace)?;
        self.inner.replace_values(key, ttl, values).await
    }

    async fn delete(&self, key: &RecordKey) -> Result<()> {
        self.log(Call::Delete(key.to_string()));
        self.check(FailOn::Delete)?;
        self.inner.delete(key).await
    }

    fn store_name(&self) -> &'static str {
        "recording"
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Shared TXT declaration at `example.com/_acme/TXT`
pub fn shared_txt(values: &[&str]) -> RecordConfig {
    RecordConfig::new("example.com", "_acme", "TXT", 300)
        .with_values(values.iter().copied())
        .with_shared(true)
}

/// Exclusive A declaration at `example.com/www/A`
pub fn www_a(values: &[&str]) -> RecordConfig {
    RecordConfig::new("example.com", "www", "A", 3600).with_values(values.iter().copied())
}

/// Minimal configuration over in-memory stores
pub fn config_with(records: Vec<RecordConfig>) -> LiveDnsConfig {
    LiveDnsConfig {
        store: StoreConfig::Memory,
        state_store: StateStoreConfig::Memory,
        records,
        engine: Default::default(),
    }
}
