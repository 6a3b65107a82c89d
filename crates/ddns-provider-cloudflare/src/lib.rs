// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare API v4 implementation of the reconciler's
// `DnsProvider` trait.
//
// ## Behavior
//
// - One HTTP request per trait call
// - No retry, no backoff, no caching: every failure is returned as-is
// - HTTP timeout configured per client (30 seconds by default)
// - Specific error handling for HTTP status codes (401/403, 404, 429, 5xx)
// - Dry-run mode: reads go through, writes are logged and synthesized
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...&status=active`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_reconciler::config::{DEFAULT_CLOUDFLARE_API_BASE, ProviderConfig};
use ddns_reconciler::traits::{
    DnsProvider, DnsProviderFactory, DnsRecord, RecordRequest, Zone, ZoneStatus,
};
use ddns_reconciler::{Error, RecordType, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Provider name used in errors and logs
const PROVIDER: &str = "cloudflare";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare API response envelope
#[derive(Debug, Deserialize)]
struct CloudflareResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<CloudflareError>,
}

#[derive(Debug, Deserialize)]
struct CloudflareError {
    code: i64,
    message: String,
}

impl<T> CloudflareResponse<T> {
    /// First error message, as Cloudflare reports it
    fn first_error(&self) -> String {
        self.errors
            .first()
            .map(|e| format!("{} (code {})", e.message, e.code))
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct CloudflareZone {
    id: String,
    name: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct CloudflareDnsRecord {
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    content: String,
    #[serde(default)]
    ttl: u32,
    #[serde(default)]
    proxied: Option<bool>,
}

impl CloudflareDnsRecord {
    /// Convert to the core record; non-address types yield `None`
    fn into_record(self) -> Option<DnsRecord> {
        let record_type = RecordType::from_wire(&self.record_type)?;
        Some(DnsRecord {
            id: self.id,
            record_type,
            name: self.name,
            content: self.content,
            ttl: self.ttl,
            proxied: self.proxied.unwrap_or(false),
        })
    }
}

impl From<CloudflareZone> for Zone {
    fn from(zone: CloudflareZone) -> Self {
        Zone {
            id: zone.id,
            name: zone.name,
            status: zone.status,
        }
    }
}

/// Cloudflare DNS provider
///
/// Stateless and single-shot: one instance serves one invocation with the
/// caller's token.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (auth probe, zone lookup, record lookup)
/// - Log the intended POST/PUT payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Read and DNS:Edit permissions
    /// - `api_base`: API base URL (normally [`DEFAULT_CLOUDFLARE_API_BASE`])
    /// - `timeout`: Per-request HTTP timeout
    /// - `dry_run`: If true, perform GET requests but skip writes
    pub fn new(
        api_token: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider against the public API (live mode)
    pub fn new_live(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, DEFAULT_CLOUDFLARE_API_BASE, DEFAULT_HTTP_TIMEOUT, false)
    }

    /// Create a provider against the public API (dry-run mode)
    pub fn new_dry_run(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, DEFAULT_CLOUDFLARE_API_BASE, DEFAULT_HTTP_TIMEOUT, true)
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Send a request and decode the `result` of the response envelope
    ///
    /// # Errors
    ///
    /// - 401/403: [`Error::AuthenticationFailed`]
    /// - transport failure: [`Error::Http`]
    /// - other non-2xx or `success: false`: [`Error::Provider`]
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: request failed: {}", context, e)))?;

        let status = response.status();
        tracing::debug!("{}: HTTP {}", context, status);

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("{}: failed to read response: {}", context, e)))?;
        let envelope = serde_json::from_str::<CloudflareResponse<T>>(&body);

        if !status.is_success() {
            let detail = envelope
                .as_ref()
                .map(CloudflareResponse::first_error)
                .unwrap_or_default();

            // Map HTTP status codes to specific errors
            return Err(match status.as_u16() {
                401 | 403 => Error::auth(format!(
                    "Invalid API token or insufficient permissions. Status: {} {}",
                    status, detail
                )),
                404 => Error::provider(PROVIDER, format!("{}: not found. {}", context, detail)),
                429 => Error::provider(
                    PROVIDER,
                    format!("Rate limit exceeded. Status: {}", status),
                ),
                500..=599 => Error::provider(
                    PROVIDER,
                    format!("Cloudflare server error (transient): {} {}", status, detail),
                ),
                _ => Error::provider(
                    PROVIDER,
                    format!("{} failed: {} {}", context, status, detail),
                ),
            });
        }

        let envelope = envelope.map_err(|e| {
            Error::provider(PROVIDER, format!("{}: failed to parse response: {}", context, e))
        })?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!("{} failed: {}", context, envelope.first_error()),
            ));
        }

        envelope.result.ok_or_else(|| {
            Error::provider(PROVIDER, format!("{}: response has no result", context))
        })
    }

    /// Log a write that dry-run mode skips and synthesize its result
    fn dry_run_write(
        &self,
        method: &str,
        path: &str,
        record_id: &str,
        record: &RecordRequest,
    ) -> DnsRecord {
        tracing::info!(
            "[DRY-RUN] Would send {} {} with payload: {}",
            method,
            self.url(path),
            serde_json::to_string(record).unwrap_or_default()
        );
        DnsRecord {
            id: record_id.to_string(),
            record_type: record.record_type,
            name: record.name.clone(),
            content: record.content.clone(),
            ttl: record.ttl,
            proxied: record.proxied,
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Probe the token by listing one accessible zone
    ///
    /// ```http
    /// GET /zones?per_page=1
    /// Authorization: Bearer <token>
    /// ```
    async fn authenticate(&self) -> Result<()> {
        let request = self.client.get(self.url("/zones")).query(&[("per_page", "1")]);

        match self.send::<Vec<CloudflareZone>>(request, "Authentication").await {
            Ok(_) => Ok(()),
            Err(Error::AuthenticationFailed(msg)) => Err(Error::AuthenticationFailed(msg)),
            Err(e) => Err(Error::auth(e.to_string())),
        }
    }

    /// ```http
    /// GET /zones?name=example.com&status=active
    /// ```
    async fn list_zones(&self, name: &str, status: ZoneStatus) -> Result<Vec<Zone>> {
        tracing::debug!("Looking up zone: {} ({})", name, status.as_str());
        let request = self
            .client
            .get(self.url("/zones"))
            .query(&[("name", name), ("status", status.as_str())]);

        let zones: Vec<CloudflareZone> = self.send(request, "Zone lookup").await?;
        Ok(zones.into_iter().map(Zone::from).collect())
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com
    /// ```
    async fn list_records(&self, zone_id: &str, name: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Listing records for {} in zone {}", name, zone_id);
        let request = self
            .client
            .get(self.url(&format!("/zones/{}/dns_records", zone_id)))
            .query(&[("name", name)]);

        let records: Vec<CloudflareDnsRecord> = self.send(request, "Record lookup").await?;
        Ok(records
            .into_iter()
            .filter_map(CloudflareDnsRecord::into_record)
            .collect())
    }

    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// {"type": "A", "name": "...", "content": "...", "ttl": 1, "proxied": false}
    /// ```
    async fn create_record(&self, zone_id: &str, record: &RecordRequest) -> Result<DnsRecord> {
        let path = format!("/zones/{}/dns_records", zone_id);
        if self.dry_run {
            return Ok(self.dry_run_write("POST", &path, "dry-run", record));
        }

        tracing::info!(
            "Creating {} record {} -> {}",
            record.record_type,
            record.name,
            record.content
        );
        let request = self.client.post(self.url(&path)).json(record);
        let created: CloudflareDnsRecord = self.send(request, "Record create").await?;

        created.into_record().ok_or_else(|| {
            Error::provider(PROVIDER, "Record create returned a non-address record")
        })
    }

    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {"type": "A", "name": "...", "content": "...", "ttl": 1, "proxied": false}
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordRequest,
    ) -> Result<DnsRecord> {
        let path = format!("/zones/{}/dns_records/{}", zone_id, record_id);
        if self.dry_run {
            return Ok(self.dry_run_write("PUT", &path, record_id, record));
        }

        tracing::info!(
            "Updating {} record {} -> {}",
            record.record_type,
            record.name,
            record.content
        );
        let request = self.client.put(self.url(&path)).json(record);
        let updated: CloudflareDnsRecord = self.send(request, "Record update").await?;

        updated.into_record().ok_or_else(|| {
            Error::provider(PROVIDER, "Record update returned a non-address record")
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig, api_token: &str) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare {
                api_base,
                timeout_secs,
                dry_run,
            } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token is required"));
                }

                if *dry_run {
                    tracing::warn!(
                        "Cloudflare provider running in DRY-RUN mode - no changes will be made"
                    );
                }

                Ok(Box::new(CloudflareProvider::new(
                    api_token,
                    api_base.clone(),
                    Duration::from_secs(*timeout_secs),
                    *dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use ddns_reconciler::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// ddns_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ddns_reconciler::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(CloudflareFactory));
}
