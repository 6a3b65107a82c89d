//! Record reconciliation for one (domain, family) pair
//!
//! The decision is a pure function of the already-fetched records
//! ([`plan`]); [`reconcile_record`] then performs at most one write.

use crate::address::{AddressSet, RecordType};
use crate::diagnostics::DiagnosticLog;
use crate::engine::report::Outcome;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsRecord, RecordRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Whether missing records may be created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Create missing records, update stale ones
    #[default]
    Upsert,
    /// Only update existing records; a missing one is [`Error::RecordNotFound`]
    UpdateOnly,
}

/// What to do for one record type
#[derive(Debug, PartialEq, Eq)]
pub enum RecordPlan<'a> {
    /// Existing record already has the content
    Skip,
    /// No record of this type exists
    Create,
    /// Existing record has other content
    Update {
        /// The record to overwrite
        existing: &'a DnsRecord,
    },
}

/// Find the single record of `record_type` among a name's records
///
/// More than one match is [`Error::AmbiguousRecord`].
pub fn find_existing<'a>(
    records: &'a [DnsRecord],
    name: &str,
    record_type: RecordType,
) -> Result<Option<&'a DnsRecord>> {
    let mut matches = records.iter().filter(|r| r.record_type == record_type);
    let first = matches.next();
    let extra = matches.count();

    if extra > 0 {
        return Err(Error::AmbiguousRecord {
            name: name.to_string(),
            record_type: record_type.as_str(),
            count: extra + 1,
        });
    }

    Ok(first)
}

/// Decide skip/create/update; content is compared as exact strings
pub fn plan<'a>(
    records: &'a [DnsRecord],
    name: &str,
    record_type: RecordType,
    content: &str,
) -> Result<RecordPlan<'a>> {
    Ok(match find_existing(records, name, record_type)? {
        Some(existing) if existing.content == content => RecordPlan::Skip,
        Some(existing) => RecordPlan::Update { existing },
        None => RecordPlan::Create,
    })
}

/// First address family with no existing record
///
/// Update-only requests check every family here before issuing any write.
pub fn missing_family(
    records: &[DnsRecord],
    name: &str,
    addresses: &AddressSet,
) -> Option<RecordType> {
    addresses.entries().find_map(|(record_type, content)| {
        matches!(plan(records, name, record_type, content), Ok(RecordPlan::Create))
            .then_some(record_type)
    })
}

/// Desired state of one record
#[derive(Debug, Clone)]
pub struct RecordTarget<'a> {
    /// Zone holding the record
    pub zone_id: &'a str,
    /// Fully-qualified record name
    pub name: &'a str,
    /// Record type
    pub record_type: RecordType,
    /// Address to publish
    pub content: &'a str,
    /// Proxied flag written on create/update
    pub proxied: bool,
    /// TTL written on create/update
    pub ttl: u32,
}

impl RecordTarget<'_> {
    fn request(&self) -> RecordRequest {
        RecordRequest {
            record_type: self.record_type,
            name: self.name.to_string(),
            content: self.content.to_string(),
            ttl: self.ttl,
            proxied: self.proxied,
        }
    }
}

/// Bring one record in line with `target`
///
/// Issues at most one write call. Never returns an error: failures are
/// folded into [`Outcome::Failed`].
pub async fn reconcile_record(
    provider: &dyn DnsProvider,
    target: &RecordTarget<'_>,
    existing: &[DnsRecord],
    mode: WriteMode,
    log: DiagnosticLog,
) -> Outcome {
    let record_type = target.record_type;

    let decision = match plan(existing, target.name, record_type, target.content) {
        Ok(decision) => decision,
        Err(e) => {
            log.error(&e);
            return Outcome::Failed(e);
        }
    };

    match decision {
        RecordPlan::Skip => {
            debug!("{} {} already {}", target.name, record_type, target.content);
            log.info(format!(
                "Skipped record, because {} is already up-to-date.",
                record_type.family()
            ));
            Outcome::Skipped
        }
        RecordPlan::Update { existing } => {
            debug!(
                "Updating {} {} {} -> {} (record {})",
                target.name, record_type, existing.content, target.content, existing.id
            );
            match provider
                .update_record(target.zone_id, &existing.id, &target.request())
                .await
            {
                Ok(_) => {
                    log.info(format!(
                        "Updated {}-Record with ip '{}' successfully.",
                        record_type, target.content
                    ));
                    Outcome::Updated
                }
                Err(e) => write_failed("update", target, e, log),
            }
        }
        RecordPlan::Create if mode == WriteMode::UpdateOnly => {
            log.error(format!(
                "No {} record exists for '{}' and creation is disabled.",
                record_type, target.name
            ));
            Outcome::Failed(Error::RecordNotFound(target.name.to_string()))
        }
        RecordPlan::Create => {
            debug!("Creating {} {} -> {}", target.name, record_type, target.content);
            match provider
                .create_record(target.zone_id, &target.request())
                .await
            {
                Ok(_) => {
                    log.info(format!(
                        "Created new {}-Record for '{}' with ip '{}' successfully.",
                        record_type, target.name, target.content
                    ));
                    Outcome::Created
                }
                Err(e) => write_failed("create", target, e, log),
            }
        }
    }
}

fn write_failed(
    action: &'static str,
    target: &RecordTarget<'_>,
    cause: Error,
    log: DiagnosticLog,
) -> Outcome {
    let error = Error::RecordWriteFailed {
        action,
        name: target.name.to_string(),
        record_type: target.record_type.as_str(),
        message: cause.to_string(),
    };
    log.error(format!("Could not {} record for '{}'.", action, target.name));
    debug!("{}", error);
    Outcome::Failed(error)
}
