// # Gandi LiveDNS Record Store
//
// RecordStore implementation over the Gandi LiveDNS v5 HTTP API.
//
// ## Behavior
//
// - One HTTP request per store call, no retries, no caching
// - 404 maps to `Error::NotFound` so the reconciler can treat the record
//   set as absent; every other failure is a `Provider` error
// - 30 second HTTP timeout
// - Dry-run mode performs GETs and logs writes without sending them
//
// ## Security
//
// - The API key never appears in logs or in Debug output
// - The factory fails fast on an empty key
//
// ## API Reference
//
// - Record set: `/livedns/domains/{fqdn}/records/{rrset_name}/{rrset_type}`
//   - GET: fetch, PUT: replace ttl and values, DELETE: delete
// - Create: POST `/livedns/domains/{fqdn}/records`
// - Authentication: `Authorization: Apikey <key>`

use async_trait::async_trait;
use livedns_core::config::StoreConfig;
use livedns_core::traits::{RecordStore, RecordStoreFactory, RemoteRecord};
use livedns_core::{Error, RecordKey, Result, StoreRegistry};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gandi public API base URL
pub const GANDI_API_BASE: &str = "https://api.gandi.net/v5";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "gandi";

/// Record set as returned by GET
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct RrsetResponse {
    rrset_name: String,
    rrset_type: String,
    rrset_ttl: u32,
    #[serde(default)]
    rrset_href: String,
    #[serde(default)]
    rrset_values: Vec<String>,
}

impl From<RrsetResponse> for RemoteRecord {
    fn from(r: RrsetResponse) -> Self {
        RemoteRecord {
            name: r.rrset_name,
            record_type: r.rrset_type,
            ttl: r.rrset_ttl,
            href: r.rrset_href,
            values: r.rrset_values,
        }
    }
}

/// POST body for a new record set
#[derive(Debug, Serialize)]
struct CreateRrset<'a> {
    rrset_name: &'a str,
    rrset_type: &'a str,
    rrset_ttl: u32,
    rrset_values: &'a [String],
}

/// PUT body replacing ttl and values of an existing record set
#[derive(Debug, Serialize)]
struct ReplaceRrset<'a> {
    rrset_ttl: u32,
    rrset_values: &'a [String],
}

/// Gandi LiveDNS record store
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the store still fetches record sets, but create,
/// replace and delete only log the request they would send and report
/// success with the record set they would have produced.
pub struct GandiLiveDns {
    /// LiveDNS API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL
    api_url: reqwest::Url,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for GandiLiveDns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GandiLiveDns")
            .field("api_key", &"<REDACTED>")
            .field("api_url", &self.api_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl GandiLiveDns {
    /// Create a new Gandi LiveDNS store
    ///
    /// # Parameters
    ///
    /// - `api_key`: LiveDNS API key
    /// - `api_url`: API base URL; defaults to [`GANDI_API_BASE`]
    /// - `dry_run`: If true, perform GET requests but skip writes
    ///
    /// # Errors
    ///
    /// `Error::Config` if the key is empty or the URL is not a usable base,
    /// `Error::Http` if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, api_url: Option<String>, dry_run: bool) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("Gandi API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let raw_url = api_url.unwrap_or_else(|| GANDI_API_BASE.to_string());
        let api_url = reqwest::Url::parse(&raw_url)
            .map_err(|e| Error::config(format!("Invalid Gandi API URL {}: {}", raw_url, e)))?;
        if api_url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "Gandi API URL cannot be used as a base: {}",
                raw_url
            )));
        }

        Ok(Self {
            api_key,
            api_url,
            client,
            dry_run,
        })
    }

    /// Whether writes are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = self.api_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                Error::config(format!("Gandi API URL cannot be used as a base: {}", self.api_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn records_url(&self, zone: &str) -> Result<reqwest::Url> {
        self.endpoint(&["livedns", "domains", zone, "records"])
    }

    fn rrset_url(&self, key: &RecordKey) -> Result<reqwest::Url> {
        self.endpoint(&[
            "livedns",
            "domains",
            &key.zone,
            "records",
            &key.name,
            &key.record_type,
        ])
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(reqwest::header::AUTHORIZATION, format!("Apikey {}", self.api_key))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(&self, request: reqwest::RequestBuilder, key: &RecordKey) -> Result<reqwest::Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(status_error(status.as_u16(), key, &body))
    }

    /// Record set this store would hold after a write
    fn expected(&self, key: &RecordKey, ttl: u32, values: &[String]) -> Result<RemoteRecord> {
        Ok(RemoteRecord {
            name: key.name.clone(),
            record_type: key.record_type.clone(),
            ttl,
            href: self.rrset_url(key)?.to_string(),
            values: values.to_vec(),
        })
    }
}

/// Map a non-success status to an error
fn status_error(status: u16, key: &RecordKey, body: &str) -> Error {
    match status {
        404 => Error::not_found(format!("Record set not found: {}", key)),
        401 | 403 => Error::provider(
            PROVIDER,
            format!(
                "Authentication failed: invalid API key or insufficient permissions. Status: {}",
                status
            ),
        ),
        409 => Error::provider(
            PROVIDER,
            format!("Conflict on {}: record set already exists. Status: {}", key, status),
        ),
        429 => Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Gandi server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(
            PROVIDER,
            format!("Request for {} failed: {} - {}", key, status, body),
        ),
    }
}

#[async_trait]
impl RecordStore for GandiLiveDns {
    async fn fetch(&self, key: &RecordKey) -> Result<RemoteRecord> {
        let url = self.rrset_url(key)?;
        tracing::debug!("Fetching record set {}", key);

        let response = self.send(self.client.get(url), key).await?;
        let rrset: RrsetResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        Ok(rrset.into())
    }

    async fn create(&self, key: &RecordKey, ttl: u32, values: &[String]) -> Result<RemoteRecord> {
        let url = self.records_url(&key.zone)?;
        let body = CreateRrset {
            rrset_name: &key.name,
            rrset_type: &key.record_type,
            rrset_ttl: ttl,
            rrset_values: values,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would POST to {} with payload: {}",
                url,
                serde_json::to_string(&body)?
            );
            return self.expected(key, ttl, values);
        }

        tracing::info!("Creating record set {} ({} value(s))", key, values.len());
        self.send(self.client.post(url).json(&body), key).await?;
        self.expected(key, ttl, values)
    }

    async fn replace_values(
        &self,
        key: &RecordKey,
        ttl: u32,
        values: &[String],
    ) -> Result<RemoteRecord> {
        let url = self.rrset_url(key)?;
        let body = ReplaceRrset {
            rrset_ttl: ttl,
            rrset_values: values,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would PUT to {} with payload: {}",
                url,
                serde_json::to_string(&body)?
            );
            return self.expected(key, ttl, values);
        }

        tracing::info!("Replacing record set {} ({} value(s))", key, values.len());
        self.send(self.client.put(url).json(&body), key).await?;
        self.expected(key, ttl, values)
    }

    async fn delete(&self, key: &RecordKey) -> Result<()> {
        let url = self.rrset_url(key)?;

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would DELETE {}", url);
            return Ok(());
        }

        tracing::info!("Deleting record set {}", key);
        self.send(self.client.delete(url), key).await?;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Gandi LiveDNS stores
///
/// `LIVEDNS_MODE=dry-run` in the environment turns on dry-run mode.
pub struct GandiFactory;

impl RecordStoreFactory for GandiFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
        match config {
            StoreConfig::Gandi { api_key, api_url } => {
                if api_key.is_empty() {
                    return Err(Error::config("Gandi API key is required"));
                }

                let dry_run = std::env::var("LIVEDNS_MODE")
                    .unwrap_or_default()
                    .eq_ignore_ascii_case("dry-run");

                if dry_run {
                    tracing::warn!("Gandi store running in DRY-RUN mode - no changes will be made");
                }

                Ok(Box::new(GandiLiveDns::new(
                    api_key.clone(),
                    api_url.clone(),
                    dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for Gandi record store")),
        }
    }
}

/// Register the Gandi store with a registry
///
/// # Example
///
/// ```rust
/// use livedns_core::StoreRegistry;
///
/// let registry = StoreRegistry::with_builtins();
/// livedns_provider_gandi::register(&registry);
/// assert!(registry.has_store("gandi"));
/// ```
pub fn register(registry: &StoreRegistry) {
    registry.register_store(PROVIDER, Box::new(GandiFactory));
}
