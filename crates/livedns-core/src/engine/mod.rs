//! Reconcile engine
//!
//! The ReconcileEngine is responsible for:
//! - Refreshing the local view of every managed record
//! - Planning changes between declarations and local state
//! - Driving the [`Reconciler`] through those changes
//! - Persisting the returned local view after each successful write
//!
//! ## Architecture
//!
//! ```text
//!  declared records ──┐
//!                     ▼
//!             ┌────────────────┐        ┌─────────────┐
//!             │ ReconcileEngine│───────▶│  Reconciler │──▶ RecordStore
//!             └────────────────┘        └─────────────┘
//!                │          │
//!                ▼          ▼
//!         ┌────────────┐ ┌──────────┐
//!         │ StateStore │ │  Events  │
//!         └────────────┘ └──────────┘
//! ```
//!
//! ## Apply Flow
//!
//! 1. Refresh: read every managed record; records gone remotely are
//!    dropped from state so they get recreated
//! 2. Plan: diff declarations against the refreshed state
//! 3. Execute deletes, then creates and updates
//! 4. Persist state after every successful remote call
//!
//! A failing record is logged and reported; the remaining records are
//! still processed. Remote calls are never retried here.

pub mod plan;

pub use plan::{PlannedChange, plan};

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{LiveDnsConfig, RecordConfig};
use crate::error::{Error, Result};
use crate::identity::parse_key;
use crate::reconciler::{DeleteOutcome, Reconciler};
use crate::traits::{ManagedRecord, RecordStore, StateStore};

/// Events emitted by the ReconcileEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Run started
    Started {
        /// Operation name ("apply", "refresh", "destroy", "import")
        operation: &'static str,
        /// Number of declared records
        records_count: usize,
    },

    /// Managed record disappeared remotely and was dropped from state
    Drifted {
        /// Persisted identity
        id: String,
    },

    /// Record created (or merged into an existing shared record)
    Created {
        /// Persisted identity
        id: String,
    },

    /// Record updated
    Updated {
        /// Persisted identity
        id: String,
    },

    /// Record left as is
    Unchanged {
        /// Persisted identity
        id: String,
    },

    /// Record deleted or withdrawn from
    Deleted {
        /// Persisted identity
        id: String,
        /// What happened remotely
        outcome: DeleteOutcome,
    },

    /// Existing remote record brought under management
    Imported {
        /// Persisted identity
        id: String,
    },

    /// A change failed
    Failed {
        /// Persisted identity
        id: String,
        /// Error message
        error: String,
    },

    /// Run finished
    Finished {
        /// Operation name
        operation: &'static str,
        /// Number of failed records
        failures: usize,
    },
}

/// Outcome of one engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records created
    pub created: Vec<String>,
    /// Records updated
    pub updated: Vec<String>,
    /// Records deleted or withdrawn from
    pub deleted: Vec<String>,
    /// Records left unchanged
    pub unchanged: Vec<String>,
    /// Records dropped from state because they vanished remotely
    pub drifted: Vec<String>,
    /// Records that failed, with the error message
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    /// Whether every record went through without error
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Engine driving a set of declared records to the remote store
///
/// ## Threading
///
/// One run at a time. Records are processed sequentially so that no two
/// writes to the same record identity overlap.
pub struct ReconcileEngine {
    /// Reconciler over the remote store
    reconciler: Reconciler,

    /// Local view of managed records
    state_store: Box<dyn StateStore>,

    /// Declared records
    records: Vec<RecordConfig>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl ReconcileEngine {
    /// Create a new engine
    ///
    /// The configuration is validated here, once.
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        store: Box<dyn RecordStore>,
        state_store: Box<dyn StateStore>,
        config: LiveDnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            reconciler: Reconciler::new(store),
            state_store,
            records: config.records,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Plan changes against the current local state, without refreshing
    pub async fn plan(&self) -> Result<Vec<PlannedChange>> {
        let managed = self.state_store.list().await?;
        Ok(plan(&self.records, &managed))
    }

    /// Refresh the local view of every managed record
    pub async fn refresh(&self) -> Result<RunSummary> {
        self.emit_started("refresh");
        let mut summary = RunSummary::default();
        self.refresh_into(&mut summary).await?;
        self.finish("refresh", summary).await
    }

    /// Refresh, plan and apply every declared record
    pub async fn apply(&self) -> Result<RunSummary> {
        self.emit_started("apply");
        let mut summary = RunSummary::default();

        self.refresh_into(&mut summary).await?;

        // Records that could not be refreshed are left alone this run
        let skipped: HashSet<String> = summary.failed.iter().map(|(id, _)| id.clone()).collect();

        let managed = self.state_store.list().await?;
        for change in plan(&self.records, &managed) {
            let id = change.id();
            if skipped.contains(&id) {
                debug!("Skipping {} after failed refresh", id);
                continue;
            }

            match self.execute(&change).await {
                Ok(()) => match change {
                    PlannedChange::Create { .. } => summary.created.push(id),
                    PlannedChange::Update { .. } => summary.updated.push(id),
                    PlannedChange::Delete { .. } => summary.deleted.push(id),
                    PlannedChange::Noop { .. } => summary.unchanged.push(id),
                },
                Err(e) => self.record_failure(&mut summary, id, e),
            }
        }

        self.finish("apply", summary).await
    }

    /// Delete every managed record, declared or not
    pub async fn destroy(&self) -> Result<RunSummary> {
        self.emit_started("destroy");
        let mut summary = RunSummary::default();

        for managed in self.state_store.list().await? {
            let id = managed.id.clone();
            let change = PlannedChange::Delete { managed };
            match self.execute(&change).await {
                Ok(()) => summary.deleted.push(id),
                Err(e) => self.record_failure(&mut summary, id, e),
            }
        }

        self.finish("destroy", summary).await
    }

    /// Bring an existing remote record under management
    ///
    /// The record is imported in exclusive mode with the remote values
    /// adopted; the next apply converges it to its declaration.
    pub async fn import(&self, id: &str) -> Result<ManagedRecord> {
        self.emit_started("import");
        let key = parse_key(id)?;

        let record = self
            .reconciler
            .read(id, &[], false)
            .await?
            .ok_or_else(|| Error::not_found(format!("Cannot import {}: no such record", key)))?;

        self.state_store.put(&record).await?;
        self.state_store.flush().await?;

        info!("Imported {} with {} value(s)", record.id, record.values.len());
        self.emit_event(EngineEvent::Imported {
            id: record.id.clone(),
        });
        self.emit_event(EngineEvent::Finished {
            operation: "import",
            failures: 0,
        });
        Ok(record)
    }

    async fn refresh_into(&self, summary: &mut RunSummary) -> Result<()> {
        for managed in self.state_store.list().await? {
            let id = managed.id.clone();
            match self
                .reconciler
                .read(&id, &managed.values, managed.shared)
                .await
            {
                Ok(Some(refreshed)) => {
                    if refreshed.ttl != managed.ttl {
                        warn!("Record {} ttl drifted: {} -> {}", id, managed.ttl, refreshed.ttl);
                    }
                    self.state_store.put(&refreshed).await?;
                }
                Ok(None) => {
                    self.state_store.remove(&id).await?;
                    self.emit_event(EngineEvent::Drifted { id: id.clone() });
                    summary.drifted.push(id);
                }
                Err(e) => self.record_failure(summary, id, e),
            }
        }
        Ok(())
    }

    /// Apply a single planned change and persist the result
    async fn execute(&self, change: &PlannedChange) -> Result<()> {
        match change {
            PlannedChange::Create { record } => {
                let managed = self.reconciler.create(record).await?;
                self.state_store.put(&managed).await?;
                self.emit_event(EngineEvent::Created { id: managed.id });
            }
            PlannedChange::Update { id, record } => {
                let managed = self.reconciler.update(id, record).await?;
                self.state_store.put(&managed).await?;
                self.emit_event(EngineEvent::Updated { id: managed.id });
            }
            PlannedChange::Delete { managed } => {
                let outcome = self
                    .reconciler
                    .delete(&managed.id, &managed.values, managed.shared)
                    .await?;
                self.state_store.remove(&managed.id).await?;
                self.emit_event(EngineEvent::Deleted {
                    id: managed.id.clone(),
                    outcome,
                });
            }
            PlannedChange::Noop { id } => {
                debug!("Record {} is up to date", id);
                self.emit_event(EngineEvent::Unchanged { id: id.clone() });
            }
        }
        Ok(())
    }

    fn record_failure(&self, summary: &mut RunSummary, id: String, e: Error) {
        error!("Record {} failed: {}", id, e);
        self.emit_event(EngineEvent::Failed {
            id: id.clone(),
            error: e.to_string(),
        });
        summary.failed.push((id, e.to_string()));
    }

    fn emit_started(&self, operation: &'static str) {
        info!(
            "Starting {} against {} ({} declared record(s))",
            operation,
            self.reconciler.store_name(),
            self.records.len()
        );
        self.emit_event(EngineEvent::Started {
            operation,
            records_count: self.records.len(),
        });
    }

    async fn finish(&self, operation: &'static str, summary: RunSummary) -> Result<RunSummary> {
        self.state_store.flush().await?;
        info!(
            "Finished {}: {} created, {} updated, {} deleted, {} unchanged, {} drifted, {} failed",
            operation,
            summary.created.len(),
            summary.updated.len(),
            summary.deleted.len(),
            summary.unchanged.len(),
            summary.drifted.len(),
            summary.failed.len()
        );
        self.emit_event(EngineEvent::Finished {
            operation,
            failures: summary.failed.len(),
        });
        Ok(summary)
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
