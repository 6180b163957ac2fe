// # livedns-core
//
// Core library for reconciling locally declared DNS record values against a
// remote authoritative record store.
//
// ## Architecture Overview
//
// - **values**: Pure helpers for dedup, quoting, lookup and removal over value lists
// - **identity**: The `zone/name/type` record identity and its persisted form
// - **RecordStore**: Trait for the remote store (fetch, create, replace, delete)
// - **Reconciler**: Create/read/update/delete transitions for exclusive and shared records
// - **StateStore**: Trait for the local view of managed records
// - **ReconcileEngine**: Refresh, plan and apply a whole set of declarations
// - **StoreRegistry**: Plugin-based registry for record stores and state stores
//
// ## Shared Records
//
// A TXT record set may collect values from several independent owners. In
// shared mode this library only ever adds or withdraws the caller's own
// values and keeps everybody else's intact. The store offers no
// conditional write, so two owners updating the same record at the same
// moment can still lose one of the updates.

pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod reconciler;
pub mod registry;
pub mod state;
pub mod store;
pub mod traits;
pub mod values;

// Re-export core types for convenience
pub use config::{LiveDnsConfig, RecordConfig, StateStoreConfig, StoreConfig};
pub use engine::{EngineEvent, PlannedChange, ReconcileEngine, RunSummary};
pub use error::{Error, Result};
pub use identity::{RecordKey, build_key, parse_key};
pub use reconciler::{DeleteOutcome, Reconciler};
pub use registry::StoreRegistry;
pub use state::{FileStateStore, MemoryStateStore};
pub use store::MemoryRecordStore;
pub use traits::{ManagedRecord, RecordStore, RemoteRecord, StateStore};
