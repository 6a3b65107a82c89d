// # DNS Provider Trait
//
// Defines the capability interface the reconciler needs from a DNS provider:
// zone lookup, record listing, record create/update and an authentication
// probe.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
// - Tests: call-counting fakes in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use ddns_reconciler::traits::{DnsProvider, ZoneStatus};
//
// async fn show(provider: &dyn DnsProvider) -> ddns_reconciler::Result<()> {
//     provider.authenticate().await?;
//     for zone in provider.list_zones("example.com", ZoneStatus::Active).await? {
//         let records = provider.list_records(&zone.id, "home.example.com").await?;
//         println!("{}: {} record(s)", zone.name, records.len());
//     }
//     Ok(())
// }
// ```

use crate::address::RecordType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// TTL value the provider interprets as "automatic"
pub const AUTO_TTL: u32 = 1;

/// Zone status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    /// Zone is active and serving
    Active,
}

impl ZoneStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneStatus::Active => "active",
        }
    }
}

/// A provider zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider-assigned zone id
    pub id: String,
    /// Zone name (e.g. "example.com")
    pub name: String,
    /// Provider-reported status (e.g. "active")
    pub status: String,
}

/// An existing address record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned record id
    pub id: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Fully-qualified record name
    pub name: String,
    /// Address string
    pub content: String,
    /// Time-to-live (1 = automatic)
    pub ttl: u32,
    /// Whether traffic is proxied through the provider's edge
    pub proxied: bool,
}

/// Field set sent on create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Fully-qualified record name
    pub name: String,
    /// Address string
    pub content: String,
    /// Time-to-live
    pub ttl: u32,
    /// Proxied flag
    pub proxied: bool,
}

/// Trait for DNS provider implementations
///
/// Each method is a single round-trip to the provider. Implementations must
/// not retry, cache, or decide whether a write is needed: the reconciler owns
/// those decisions and always re-derives state from the provider.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Capability probe confirming the credential is accepted
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Credential works
    /// - `Err(Error::AuthenticationFailed)`: Credential rejected
    async fn authenticate(&self) -> Result<(), crate::Error>;

    /// List zones with the given name and status
    async fn list_zones(
        &self,
        name: &str,
        status: ZoneStatus,
    ) -> Result<Vec<Zone>, crate::Error>;

    /// List records in a zone whose name equals `name`
    ///
    /// Records of types other than A/AAAA are omitted.
    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a record
    async fn create_record(
        &self,
        zone_id: &str,
        record: &RecordRequest,
    ) -> Result<DnsRecord, crate::Error>;

    /// Replace an existing record
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordRequest,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
///
/// Providers are built per invocation because the credential arrives with
/// the request.
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    /// - `api_token`: Credential supplied by the caller
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
        api_token: &str,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
