//! Record identity
//!
//! A remote record set is addressed by its zone, name and type. The
//! persisted identity is the slash-joined form `zone/name/type`, which is
//! the only durable artifact the reconciler produces.
//!
//! Components containing `/` cannot be represented; configuration
//! validation rejects them before a key is ever built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::{RecordStore, RemoteRecord};

const SEPARATOR: char = '/';

/// Composite key of a remote record set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// Zone (domain) the record belongs to
    pub zone: String,
    /// Record name within the zone
    pub name: String,
    /// Record type
    pub record_type: String,
}

impl RecordKey {
    /// Create a new key
    ///
    /// Record types are case-insensitive; the type is stored uppercase so
    /// that `txt` and `TXT` address the same record set.
    pub fn new(
        zone: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
    ) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
            record_type: Into::<String>::into(record_type).to_ascii_uppercase(),
        }
    }

    /// Whether the key addresses a TXT record set
    pub fn is_txt(&self) -> bool {
        self.record_type.eq_ignore_ascii_case("TXT")
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&build_key(&self.zone, &self.name, &self.record_type))
    }
}

impl FromStr for RecordKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_key(s)
    }
}

/// Join the components into the persisted identity
pub fn build_key(zone: &str, name: &str, record_type: &str) -> String {
    format!("{zone}{SEPARATOR}{name}{SEPARATOR}{record_type}")
}

/// Split a persisted identity back into its components
///
/// # Errors
///
/// [`Error::MalformedId`] unless `id` splits into exactly three parts.
pub fn parse_key(id: &str) -> Result<RecordKey> {
    let parts: Vec<&str> = id.split(SEPARATOR).collect();
    match parts.as_slice() {
        [zone, name, record_type] => Ok(RecordKey::new(*zone, *name, *record_type)),
        _ => Err(Error::malformed_id(id)),
    }
}

/// Fetch the record set for `key`, mapping "not found" to `None`
///
/// A record that disappeared remotely is logically absent rather than an
/// error, so callers can drop their local identity and recreate it later.
/// Every other failure is returned unchanged.
pub async fn fetch_existing(
    store: &dyn RecordStore,
    key: &RecordKey,
) -> Result<Option<RemoteRecord>> {
    match store.fetch(key).await {
        Ok(record) => Ok(Some(record)),
        Err(e) if e.is_not_found() => {
            debug!("Record {} not found in {}", key, store.store_name());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
