// # State Store Trait
//
// Defines the interface for the local view of managed records.
//
// ## Purpose
//
// The state store remembers, per record identity, what this caller
// manages: the declared values (or the adopted remote values for
// exclusive records), ttl, href and the shared flag. It never holds
// values contributed by other owners of a shared record.
//
// ## Implementations
//
// - File-based: versioned JSON file
// - In-memory: for tests and throwaway runs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::identity::RecordKey;
use crate::traits::record_store::RemoteRecord;

/// Local view of a record managed by this caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedRecord {
    /// Persisted identity, `zone/name/type`
    pub id: String,
    /// Zone the record lives in
    pub zone: String,
    /// Record name
    pub name: String,
    /// Record type
    pub record_type: String,
    /// Time-to-live as last observed remotely
    pub ttl: u32,
    /// Store-specific URL of the record set
    pub href: String,
    /// Values under this caller's management
    pub values: Vec<String>,
    /// Whether the record is shared with other owners
    pub shared: bool,
    /// Timestamp of the last successful remote observation or write
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl ManagedRecord {
    /// Build the local view from a remote record
    ///
    /// `values` is what the caller keeps under management; the remote
    /// value list is not consulted. Zone, name and type always come from
    /// `key`, so they agree with `id` whatever spelling the store returns.
    pub(crate) fn observed(
        key: &RecordKey,
        remote: &RemoteRecord,
        values: Vec<String>,
        shared: bool,
    ) -> Self {
        Self {
            id: key.to_string(),
            zone: key.zone.clone(),
            name: key.name.clone(),
            record_type: key.record_type.clone(),
            ttl: remote.ttl,
            href: remote.href.clone(),
            values,
            shared,
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Trait for state store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Implementation Guidelines
///
/// - **Async I/O only**: Use async file/database operations, never blocking I/O
/// - **Explicit flush**: `flush()` must persist all pending changes
/// - **No business logic**: what to store is decided by the engine
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the managed record stored under `id`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ManagedRecord))`: The record
    /// - `Ok(None)`: Not managed
    /// - `Err(Error)`: Storage error
    async fn get(&self, id: &str) -> Result<Option<ManagedRecord>, crate::Error>;

    /// Create or replace a managed record, keyed by its `id`
    async fn put(&self, record: &ManagedRecord) -> Result<(), crate::Error>;

    /// Forget a managed record
    ///
    /// Succeeds if the record was not present.
    async fn remove(&self, id: &str) -> Result<(), crate::Error>;

    /// List every managed record
    async fn list(&self) -> Result<Vec<ManagedRecord>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing state stores from configuration
#[async_trait]
pub trait StateStoreFactory: Send + Sync {
    /// Create a StateStore instance from configuration
    async fn create(
        &self,
        config: &crate::config::StateStoreConfig,
    ) -> Result<Box<dyn StateStore>, crate::Error>;
}
