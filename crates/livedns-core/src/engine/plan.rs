//! Change planning
//!
//! Diffs the declared records against the local state and decides, per
//! record identity, what the engine has to do. Pure: no store is touched.
//!
//! Zone, name and type form the identity, so changing any of them shows
//! up as a delete of the old identity plus a create of the new one.

use std::collections::HashSet;
use std::fmt;

use crate::config::RecordConfig;
use crate::traits::ManagedRecord;
use crate::values;

/// One planned change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedChange {
    /// Declared but not managed yet
    Create {
        /// The declaration to create
        record: RecordConfig,
    },
    /// Managed and declared, but ttl, values or sharing differ
    Update {
        /// Persisted identity
        id: String,
        /// The new declaration
        record: RecordConfig,
    },
    /// Managed but no longer declared
    Delete {
        /// The local view to remove
        managed: ManagedRecord,
    },
    /// Managed and up to date
    Noop {
        /// Persisted identity
        id: String,
    },
}

impl PlannedChange {
    /// Persisted identity the change applies to
    pub fn id(&self) -> String {
        match self {
            PlannedChange::Create { record } => record.key().to_string(),
            PlannedChange::Update { id, .. } | PlannedChange::Noop { id } => id.clone(),
            PlannedChange::Delete { managed } => managed.id.clone(),
        }
    }

    /// Whether applying this change touches the remote store
    pub fn is_change(&self) -> bool {
        !matches!(self, PlannedChange::Noop { .. })
    }
}

impl fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedChange::Create { record } => write!(
                f,
                "+ create {} ttl={} values={:?}{}",
                record.key(),
                record.ttl,
                record.values,
                if record.is_shared() { " (shared)" } else { "" }
            ),
            PlannedChange::Update { id, record } => write!(
                f,
                "~ update {} ttl={} values={:?}{}",
                id,
                record.ttl,
                record.values,
                if record.is_shared() { " (shared)" } else { "" }
            ),
            PlannedChange::Delete { managed } => write!(
                f,
                "- delete {} values={:?}{}",
                managed.id,
                managed.values,
                if managed.shared { " (shared)" } else { "" }
            ),
            PlannedChange::Noop { id } => write!(f, "  keep {}", id),
        }
    }
}

/// Compute the changes needed to move `managed` to `declared`
///
/// Deletes come first so that a record moved to a new identity is
/// released before its replacement is created. The remaining changes
/// follow declaration order.
pub fn plan(declared: &[RecordConfig], managed: &[ManagedRecord]) -> Vec<PlannedChange> {
    let declared_ids: HashSet<String> = declared.iter().map(|r| r.key().to_string()).collect();

    let mut changes: Vec<PlannedChange> = managed
        .iter()
        .filter(|m| !declared_ids.contains(&m.id))
        .map(|m| PlannedChange::Delete { managed: m.clone() })
        .collect();

    for record in declared {
        let id = record.key().to_string();
        let change = match managed.iter().find(|m| m.id == id) {
            None => PlannedChange::Create {
                record: record.clone(),
            },
            Some(current) if needs_update(current, record) => PlannedChange::Update {
                id,
                record: record.clone(),
            },
            Some(_) => PlannedChange::Noop { id },
        };
        changes.push(change);
    }

    changes
}

fn needs_update(current: &ManagedRecord, record: &RecordConfig) -> bool {
    current.ttl != record.ttl
        || current.shared != record.is_shared()
        || !values_match(record, &current.values)
}

// TXT stores hand values back quoted, so compare those in quoted form.
fn values_match(record: &RecordConfig, current: &[String]) -> bool {
    if record.key().is_txt() {
        values::same_set(&values::quote_all(&record.values), &values::quote_all(current))
    } else {
        values::same_set(&record.values, current)
    }
}
