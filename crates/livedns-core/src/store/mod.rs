// # Record Store Implementations
//
// Built-in implementations of the RecordStore trait. Network-backed
// stores live in their own crates (e.g. `livedns-provider-gandi`).

pub mod memory;

pub use memory::{MemoryRecordStore, MemoryRecordStoreFactory};
