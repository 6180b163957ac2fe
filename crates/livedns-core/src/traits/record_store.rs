// # Record Store Trait
//
// Defines the interface to the remote authoritative record store.
//
// ## Implementations
//
// - Gandi LiveDNS: `livedns-provider-gandi` crate
// - In-process: `livedns_core::store::MemoryRecordStore`
//
// ## Usage
//
// ```rust,ignore
// use livedns_core::{RecordKey, RecordStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* RecordStore implementation */;
//     let key: RecordKey = "example.com/_acme/TXT".parse()?;
//
//     let record = store.fetch(&key).await?;
//     store.replace_values(&key, record.ttl, &record.values).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::identity::RecordKey;

/// A record set as stored remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Record name relative to the zone (e.g. "www" or "@")
    pub name: String,
    /// Record type (e.g. "A", "TXT")
    pub record_type: String,
    /// Time-to-live of the whole record set
    pub ttl: u32,
    /// Store-specific URL of the record set
    pub href: String,
    /// Every value currently stored, including other owners' contributions
    pub values: Vec<String>,
}

/// Trait for remote record store implementations
///
/// The four operations here are the only way the reconciler touches
/// remote state. None of them offers a precondition, so a
/// fetch-compute-replace sequence on a shared record is not atomic with
/// respect to other writers.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Contract
///
/// - A record that does not exist is reported as [`crate::Error::NotFound`],
///   never as a generic failure. The reconciler relies on this to detect
///   records deleted outside its control.
/// - One remote request per call. No retry, no backoff, no caching; those
///   belong to the transport or the caller.
/// - Each call either fully applies or fails without partial effect.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the record set addressed by `key`
    ///
    /// # Returns
    ///
    /// - `Ok(RemoteRecord)`: The record as currently stored
    /// - `Err(Error::NotFound)`: No such record set
    /// - `Err(Error)`: Any other failure
    async fn fetch(&self, key: &RecordKey) -> Result<RemoteRecord, crate::Error>;

    /// Create a new record set
    ///
    /// Stores may reject the call if the record set already exists.
    async fn create(
        &self,
        key: &RecordKey,
        ttl: u32,
        values: &[String],
    ) -> Result<RemoteRecord, crate::Error>;

    /// Replace the ttl and full value set of a record set
    ///
    /// Stores that support it create the record set if it is missing.
    async fn replace_values(
        &self,
        key: &RecordKey,
        ttl: u32,
        values: &[String],
    ) -> Result<RemoteRecord, crate::Error>;

    /// Delete the whole record set
    async fn delete(&self, key: &RecordKey) -> Result<(), crate::Error>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing record stores from configuration
pub trait RecordStoreFactory: Send + Sync {
    /// Create a RecordStore instance from configuration
    fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn RecordStore>, crate::Error>;
}
