//! Shared-record reconciler
//!
//! The reconciler turns a local declaration into calls against a
//! [`RecordStore`] and returns the local view to persist.
//!
//! ## Modes
//!
//! - **Exclusive**: the declaration is the only source of truth. Values are
//!   written verbatim and the remote value list is adopted on read.
//! - **Shared** (TXT only): other owners may contribute values to the same
//!   record set. Writes merge with what is stored remotely, values are
//!   normalized to their quoted form, and the local view only ever lists
//!   the values this caller declared.
//!
//! ## Transitions
//!
//! ```text
//!            create                 update
//!  Absent ───────────▶ Present ───────────────┐
//!    ▲                    │  ▲                │
//!    │   read: not found  │  └────────────────┘
//!    ├────────────────────┤
//!    │   delete           │
//!    └────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! Shared writes are fetch, compute, replace. The store offers no
//! precondition, so two independent writers racing on the same record
//! can lose one another's update. Operations on the same identity from
//! this process are expected to be serialized by the caller.

use tracing::{debug, info, warn};

use crate::config::RecordConfig;
use crate::error::{Error, Result};
use crate::identity::{RecordKey, fetch_existing, parse_key};
use crate::traits::{ManagedRecord, RecordStore};
use crate::values;

/// What a delete did remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The whole record set was deleted
    Deleted,
    /// Only this caller's values were removed; other owners' values remain
    Withdrawn {
        /// Values left in the record set
        remaining: Vec<String>,
    },
    /// The record set was already gone
    AlreadyAbsent,
}

/// Reconciler for one remote record store
///
/// The store is injected at construction; the reconciler holds no other
/// state between calls.
pub struct Reconciler {
    store: Box<dyn RecordStore>,
}

impl Reconciler {
    /// Create a reconciler over `store`
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Name of the underlying store
    pub fn store_name(&self) -> &'static str {
        self.store.store_name()
    }

    /// Create the declared record set
    ///
    /// In shared mode an existing record set is merged into rather than
    /// created; if none exists the record is created from the declared
    /// values exactly as given.
    pub async fn create(&self, record: &RecordConfig) -> Result<ManagedRecord> {
        let key = record.key();

        if !record.is_shared() {
            info!("Creating {} with {} value(s)", key, record.values.len());
            let remote = self.store.create(&key, record.ttl, &record.values).await?;
            let adopted = remote.values.clone();
            return Ok(ManagedRecord::observed(&key, &remote, adopted, false));
        }

        let remote = match fetch_existing(self.store.as_ref(), &key).await? {
            None => {
                info!(
                    "Creating shared {} with {} value(s) (no existing record)",
                    key,
                    record.values.len()
                );
                self.store.create(&key, record.ttl, &record.values).await?
            }
            Some(existing) => {
                let merged = values::merge_shared(&existing.values, &record.values);
                info!(
                    "Merging {} declared value(s) into existing shared {} ({} -> {} value(s))",
                    record.values.len(),
                    key,
                    existing.values.len(),
                    merged.len()
                );
                debug!("Merged values for {}: {:?}", key, merged);
                self.store.replace_values(&key, record.ttl, &merged).await?
            }
        };

        Ok(ManagedRecord::observed(
            &key,
            &remote,
            record.values.clone(),
            true,
        ))
    }

    /// Refresh the local view of the record set identified by `id`
    ///
    /// `local_values` is what the caller currently has under management.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ManagedRecord))`: refreshed local view
    /// - `Ok(None)`: the record set no longer exists remotely; the caller
    ///   should drop its identity so the record gets recreated
    /// - `Err(Error)`: malformed `id` or store failure
    pub async fn read(
        &self,
        id: &str,
        local_values: &[String],
        shared: bool,
    ) -> Result<Option<ManagedRecord>> {
        let key = parse_key(id)?;
        let shared = shared && key.is_txt();

        let Some(remote) = fetch_existing(self.store.as_ref(), &key).await? else {
            warn!("Record {} no longer exists remotely; dropping it from state", key);
            return Ok(None);
        };

        let managed_values = if shared {
            local_values.to_vec()
        } else {
            remote.values.clone()
        };

        debug!(
            "Read {}: ttl={} remote_values={} managed_values={}",
            key,
            remote.ttl,
            remote.values.len(),
            managed_values.len()
        );

        Ok(Some(ManagedRecord::observed(
            &key,
            &remote,
            managed_values,
            shared,
        )))
    }

    /// Push a changed declaration for the existing record set `id`
    ///
    /// Zone, name and type are fixed for the lifetime of a record; a
    /// declaration addressing a different identity is rejected and must
    /// go through delete and create instead.
    pub async fn update(&self, id: &str, record: &RecordConfig) -> Result<ManagedRecord> {
        let key = parse_key(id)?;
        Self::ensure_same_identity(&key, record)?;

        if !record.is_shared() {
            info!("Replacing {} with {} value(s)", key, record.values.len());
            let remote = self
                .store
                .replace_values(&key, record.ttl, &record.values)
                .await?;
            let adopted = remote.values.clone();
            return Ok(ManagedRecord::observed(&key, &remote, adopted, false));
        }

        let existing = self.store.fetch(&key).await?;
        let merged = values::merge_shared(&existing.values, &record.values);
        info!(
            "Updating shared {}: ttl {} -> {}, {} -> {} value(s)",
            key,
            existing.ttl,
            record.ttl,
            existing.values.len(),
            merged.len()
        );
        debug!("Merged values for {}: {:?}", key, merged);

        let remote = self.store.replace_values(&key, record.ttl, &merged).await?;
        Ok(ManagedRecord::observed(
            &key,
            &remote,
            record.values.clone(),
            true,
        ))
    }

    /// Remove this caller's record set `id`
    ///
    /// Exclusive records are deleted outright. For shared records, a
    /// remote value count equal to the local one is taken to mean this
    /// caller is the only contributor and the whole record set goes;
    /// otherwise only the local values are withdrawn, and the record set
    /// is deleted if that leaves it empty. The count is a heuristic: the
    /// store keeps no per-value ownership.
    pub async fn delete(
        &self,
        id: &str,
        local_values: &[String],
        shared: bool,
    ) -> Result<DeleteOutcome> {
        let key = parse_key(id)?;

        if !(shared && key.is_txt()) {
            return self.delete_record_set(&key).await;
        }

        let Some(existing) = fetch_existing(self.store.as_ref(), &key).await? else {
            info!("Shared record {} already absent", key);
            return Ok(DeleteOutcome::AlreadyAbsent);
        };

        if existing.values.len() == local_values.len() {
            info!(
                "Deleting shared {}: no values from other owners ({} value(s))",
                key,
                existing.values.len()
            );
            return self.delete_record_set(&key).await;
        }

        let remaining = values::withdraw(&existing.values, local_values)?;

        // A record set cannot be left without values
        if remaining.is_empty() {
            info!(
                "Deleting shared {}: nothing left after withdrawing {} value(s)",
                key,
                local_values.len()
            );
            return self.delete_record_set(&key).await;
        }

        info!(
            "Withdrawing {} value(s) from shared {} ({} remain)",
            local_values.len(),
            key,
            remaining.len()
        );
        debug!("Remaining values for {}: {:?}", key, remaining);

        self.store
            .replace_values(&key, existing.ttl, &remaining)
            .await?;
        Ok(DeleteOutcome::Withdrawn { remaining })
    }

    async fn delete_record_set(&self, key: &RecordKey) -> Result<DeleteOutcome> {
        match self.store.delete(key).await {
            Ok(()) => {
                info!("Deleted {}", key);
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.is_not_found() => {
                info!("Record {} already absent", key);
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            Err(e) => Err(e),
        }
    }

    fn ensure_same_identity(key: &RecordKey, record: &RecordConfig) -> Result<()> {
        let declared = record.key();
        if &declared != key {
            return Err(Error::invalid_input(format!(
                "Record {} cannot be changed in place to {}; delete and recreate it",
                key, declared
            )));
        }
        Ok(())
    }
}
