//! Core traits for the livedns reconciler
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`RecordStore`]: Fetch, create, replace and delete remote record sets
//! - [`StateStore`]: Persistent local view of managed records

pub mod record_store;
pub mod state_store;

pub use record_store::{RecordStore, RecordStoreFactory, RemoteRecord};
pub use state_store::{ManagedRecord, StateStore, StateStoreFactory};
