// # OpenPLZ Lookup Service
//
// This crate provides a LookupService implementation backed by the public
// OpenPLZ API (https://www.openplzapi.org), which serves German postal codes
// and localities.
//
// ## Behaviour
//
// - One HTTP request per engine lookup
// - Every failure (transport, status, decoding) is returned to the engine,
//   which turns it into a field message
// - HTTP timeout configured per client (default 10 seconds)
// - ❌ NO retry logic (no automatic retries at all)
// - ❌ NO caching (offline caching is out of scope)
// - ❌ NO debouncing (owned by SyncEngine)
//
// ## API Reference
//
// - Localities by name: GET `/de/Localities?name=...`
// - Localities by postal code: GET `/de/Localities?postalCode=...`
//
// Both return a JSON array of objects carrying at least `postalCode` and
// `name`; extra fields (municipality, district, federal state) are ignored.

use async_trait::async_trait;
use plz_core::config::LookupServiceConfig;
use plz_core::traits::{Locality, LookupService, LookupServiceFactory};
use plz_core::{Error, Result};
use reqwest::StatusCode;
use std::time::Duration;

/// Name under which this service registers
pub const SERVICE_NAME: &str = "openplz";

/// Path of the German localities resource
const LOCALITIES_PATH: &str = "/de/Localities";

/// Largest page the API hands out; ambiguous names rarely exceed it
const PAGE_SIZE: u32 = 50;

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenPLZ lookup service
///
/// Stateless apart from the pooled HTTP client; cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct OpenPlzService {
    /// Base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl OpenPlzService {
    /// Create a new OpenPLZ service
    ///
    /// # Parameters
    ///
    /// - `base_url`: API root, e.g. "https://openplzapi.org"
    /// - `timeout`: Transport timeout per request
    ///
    /// # Returns
    ///
    /// - `Ok(OpenPlzService)`: Ready to use
    /// - `Err(Error)`: If the URL is empty or the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::config("OpenPLZ base URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("plz-lookup-openplz/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    /// Create a service against the public API with the default timeout
    pub fn public() -> Result<Self> {
        Self::new(plz_core::config::DEFAULT_OPENPLZ_URL, DEFAULT_HTTP_TIMEOUT)
    }

    /// URL of the localities resource
    fn localities_url(&self) -> String {
        format!("{}{}", self.base_url, LOCALITIES_PATH)
    }

    /// Query the localities resource with one filter parameter
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /de/Localities?name=Berlin&page=1&pageSize=50
    /// Accept: application/json
    /// ```
    async fn fetch_localities(&self, filter: &str, value: &str) -> Result<Vec<Locality>> {
        let page_size = PAGE_SIZE.to_string();
        tracing::debug!("Querying OpenPLZ localities ({}={})", filter, value);

        let response = self
            .client
            .get(self.localities_url())
            .header("Accept", "application/json")
            .query(&[(filter, value), ("page", "1"), ("pageSize", page_size.as_str())])
            .send()
            .await
            .map_err(|e| Error::lookup(SERVICE_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::lookup(SERVICE_NAME, format!("Failed to read response: {}", e)))?;

        let localities = parse_localities(&body)?;
        tracing::debug!(
            "OpenPLZ returned {} locality record(s) for {}={}",
            localities.len(),
            filter,
            value
        );
        Ok(localities)
    }
}

/// Map a non-success status to an error
fn status_error(status: StatusCode, error_text: &str) -> Error {
    match status.as_u16() {
        404 => Error::lookup(SERVICE_NAME, format!("Not found: {}", status)),
        429 => Error::rate_limited(format!(
            "OpenPLZ rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::lookup(
            SERVICE_NAME,
            format!("OpenPLZ server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::lookup(
            SERVICE_NAME,
            format!("Locality lookup failed: {} - {}", status, error_text),
        ),
    }
}

/// Decode a localities response body
///
/// Order is preserved; the engine relies on it for candidates.
fn parse_localities(body: &[u8]) -> Result<Vec<Locality>> {
    let localities: Vec<Locality> = serde_json::from_slice(body)?;
    Ok(localities)
}

#[async_trait]
impl LookupService for OpenPlzService {
    async fn localities_by_name(&self, name: &str) -> Result<Vec<Locality>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("Locality name cannot be empty"));
        }
        self.fetch_localities("name", name).await
    }

    async fn localities_by_postal_code(&self, postal_code: &str) -> Result<Vec<Locality>> {
        let postal_code = postal_code.trim();
        if postal_code.is_empty() {
            return Err(Error::invalid_input("Postal code cannot be empty"));
        }
        self.fetch_localities("postalCode", postal_code).await
    }

    fn service_name(&self) -> &'static str {
        SERVICE_NAME
    }
}

/// Factory for creating OpenPLZ services
pub struct OpenPlzFactory;

impl LookupServiceFactory for OpenPlzFactory {
    fn create(&self, config: &LookupServiceConfig) -> Result<Box<dyn LookupService>> {
        match config {
            LookupServiceConfig::OpenPlz {
                base_url,
                timeout_secs,
            } => {
                if *timeout_secs == 0 {
                    return Err(Error::config("OpenPLZ timeout must be > 0"));
                }
                Ok(Box::new(OpenPlzService::new(
                    base_url.clone(),
                    Duration::from_secs(*timeout_secs),
                )?))
            }
            _ => Err(Error::config("Invalid config for OpenPLZ lookup service")),
        }
    }
}

/// Register the OpenPLZ service with a registry
///
/// # Example
///
/// ```rust
/// use plz_core::LookupServiceRegistry;
///
/// let registry = LookupServiceRegistry::new();
/// plz_lookup_openplz::register(&registry);
/// assert!(registry.has_lookup_service("openplz"));
/// ```
pub fn register(registry: &plz_core::LookupServiceRegistry) {
    registry.register_lookup_service(SERVICE_NAME, Box::new(OpenPlzFactory));
}
