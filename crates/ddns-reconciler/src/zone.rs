//! Domain → zone resolution
//!
//! The zone candidate is always the last two labels of the domain, so
//! names under multi-label public suffixes (`home.example.co.uk`) resolve
//! to the suffix (`co.uk`) and are reported as [`Error::ZoneNotFound`].

use crate::error::{Error, Result};
use crate::traits::{DnsProvider, Zone, ZoneStatus};
use tracing::debug;

/// Derive the candidate zone name for a domain
///
/// Fails with [`Error::InvalidDomain`] for fewer than two labels or any
/// empty label.
pub fn zone_candidate(domain: &str) -> Result<String> {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(Error::invalid_domain(domain));
    }

    Ok(labels[labels.len() - 2..].join("."))
}

/// Resolve the active zone that owns `domain`
///
/// One `list_zones` call; the first returned zone whose name equals the
/// candidate wins. Not retried.
pub async fn resolve_zone(provider: &dyn DnsProvider, domain: &str) -> Result<Zone> {
    let candidate = zone_candidate(domain)?;
    debug!("Looking up zone {} for {}", candidate, domain);

    let zones = provider
        .list_zones(&candidate, ZoneStatus::Active)
        .await
        .map_err(|e| {
            debug!("Zone lookup for {} failed: {}", candidate, e);
            Error::zone_not_found(domain)
        })?;

    zones
        .into_iter()
        .find(|zone| zone.name.eq_ignore_ascii_case(&candidate))
        .ok_or_else(|| Error::zone_not_found(domain))
}
