//! Core traits for the DDNS reconciler
//!
//! - [`DnsProvider`]: Zone and record operations against a provider API
//! - [`DnsProviderFactory`]: Builds providers per request credential

pub mod dns_provider;

pub use dns_provider::{
    AUTO_TTL, DnsProvider, DnsProviderFactory, DnsRecord, RecordRequest, Zone, ZoneStatus,
};
