//! Configuration types for the livedns reconciler
//!
//! This module defines all configuration structures used throughout the crate.
//! Everything here is validated once, at the boundary, before the
//! reconciler sees it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::identity::RecordKey;

/// Lowest ttl accepted by LiveDNS (seconds)
pub const MIN_TTL: u32 = 300;

/// Highest ttl accepted by LiveDNS (30 days, in seconds)
pub const MAX_TTL: u32 = 2_592_000;

/// Main livedns configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveDnsConfig {
    /// Remote record store configuration
    pub store: StoreConfig,

    /// Local state store configuration
    #[serde(default)]
    pub state_store: StateStoreConfig,

    /// DNS records to manage
    #[serde(default)]
    pub records: Vec<RecordConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl LiveDnsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            store: StoreConfig::default(),
            state_store: StateStoreConfig::default(),
            records: Vec::new(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    ///
    /// An empty record list is valid: applying it destroys everything
    /// previously managed.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()?;
        self.state_store.validate()?;
        self.engine.validate()?;

        let mut seen = HashSet::new();
        for record in &self.records {
            record.validate()?;
            let key = record.key();
            if !seen.insert(key.clone()) {
                return Err(crate::Error::config(format!(
                    "Record {} is declared more than once",
                    key
                )));
            }
        }

        Ok(())
    }
}

impl Default for LiveDnsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Remote record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Gandi LiveDNS v5
    Gandi {
        /// Gandi API key
        #[serde(default)]
        api_key: String,
        /// API base URL (defaults to the public endpoint)
        #[serde(default)]
        api_url: Option<String>,
    },

    /// In-process store (not persistent)
    Memory,

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Gandi { api_key, api_url } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("Gandi API key cannot be empty"));
                }
                if let Some(url) = api_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "Gandi API URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom store config cannot be null"));
                }
                Ok(())
            }
            StoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Gandi { .. } => "gandi",
            StoreConfig::Memory => "memory",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Gandi {
            api_key: String::new(),
            api_url: None,
        }
    }
}

/// State store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory state store (not persistent)
    #[default]
    Memory,

    /// Custom state store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File { path } => {
                if path.trim().is_empty() {
                    return Err(crate::Error::config("State file path cannot be empty"));
                }
                Ok(())
            }
            StateStoreConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom state store factory cannot be empty",
                    ));
                }
                Ok(())
            }
            StateStoreConfig::Memory => Ok(()),
        }
    }

    /// Get the state store type name
    pub fn type_name(&self) -> &str {
        match self {
            StateStoreConfig::File { .. } => "file",
            StateStoreConfig::Memory => "memory",
            StateStoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Declaration of one record set under management
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Zone (FQDN of the domain)
    pub zone: String,

    /// Record name within the zone (e.g. "www", "@")
    pub name: String,

    /// Record type (e.g. "A", "TXT")
    #[serde(rename = "type")]
    pub record_type: String,

    /// Time-to-live in seconds
    pub ttl: u32,

    /// Values declared by this caller
    pub values: Vec<String>,

    /// Whether other owners may contribute values to the same TXT record
    #[serde(default)]
    pub shared: bool,
}

impl RecordConfig {
    /// Create a new record configuration
    pub fn new(
        zone: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
            record_type: record_type.into(),
            ttl,
            values: Vec::new(),
            shared: false,
        }
    }

    /// Set the declared values
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the record as shared
    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Identity of the declared record
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.zone, &self.name, &self.record_type)
    }

    /// Whether the record is reconciled in shared mode
    ///
    /// Sharing only applies to TXT records; the flag is ignored for any
    /// other type.
    pub fn is_shared(&self) -> bool {
        self.shared && self.key().is_txt()
    }

    /// Validate the declaration
    pub fn validate(&self) -> Result<(), crate::Error> {
        for (field, value) in [
            ("zone", &self.zone),
            ("name", &self.name),
            ("type", &self.record_type),
        ] {
            if value.is_empty() {
                return Err(crate::Error::config(format!("Record {} cannot be empty", field)));
            }
            if value.contains('/') {
                return Err(crate::Error::config(format!(
                    "Record {} cannot contain '/': {}",
                    field, value
                )));
            }
        }

        if !(MIN_TTL..=MAX_TTL).contains(&self.ttl) {
            return Err(crate::Error::config(format!(
                "Record {} ttl must be between {} and {} seconds. Got: {}",
                self.key(),
                MIN_TTL,
                MAX_TTL,
                self.ttl
            )));
        }

        if self.values.is_empty() {
            return Err(crate::Error::config(format!(
                "Record {} must declare at least one value",
                self.key()
            )));
        }

        if self.shared && !self.key().is_txt() {
            tracing::warn!(
                "Record {} is marked shared but only TXT records can be shared; treating it as exclusive",
                self.key()
            );
        }

        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    1000
}
