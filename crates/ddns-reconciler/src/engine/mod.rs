//! Batch reconciliation engine
//!
//! The DdnsEngine is responsible for:
//! - Checking batch preconditions (parameters, addresses, authentication)
//! - Resolving each domain's zone
//! - Reconciling the A/AAAA records of each domain
//! - Folding every outcome into one aggregate result
//!
//! ## Architecture
//!
//! ```text
//!   UpdateRequest ──validate──► ValidatedRequest
//!                                     │
//!                                     ▼
//!                            ┌──────────────┐
//!                            │  DdnsEngine  │── authenticate()
//!                            └──────────────┘
//!                                     │  for each domain, in order
//!         ┌───────────────────────────┼───────────────────────────┐
//!         ▼                           ▼                           ▼
//! ┌─────────────┐           ┌──────────────┐           ┌─────────────┐
//! │ resolve_zone│           │ list_records │           │ reconcile_  │
//! │             │           │ (once)       │           │ record ×2   │
//! └─────────────┘           └──────────────┘           └─────────────┘
//!                                     │
//!                                     ▼
//!                               BatchReport ──► AggregateResult
//! ```
//!
//! ## Failure Isolation
//!
//! Batch-fatal errors (missing parameters, no valid address, rejected
//! credential) return `Err` before any domain is touched. Everything
//! else is recorded against its domain and the loop moves on.

pub mod record;
pub mod report;

pub use record::{
    RecordPlan, RecordTarget, WriteMode, find_existing, missing_family, plan, reconcile_record,
};
pub use report::{
    AggregateResult, BatchReport, DomainOutcome, DomainReport, Outcome, OutcomeCounts,
    RecordOutcome,
};

use crate::address::AddressSet;
use crate::config::{DdnsConfig, EngineConfig};
use crate::diagnostics::DiagnosticLog;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use crate::zone::resolve_zone;
use chrono::Utc;
use tracing::{debug, info, warn};

/// Raw inputs of one invocation, before validation
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    /// Provider credential
    pub api_token: Option<String>,
    /// Domains to reconcile, in order
    pub domains: Vec<String>,
    /// IPv4 candidate
    pub ipv4: Option<String>,
    /// IPv6 candidate
    pub ipv6: Option<String>,
    /// Proxy flag applied to every created/updated record
    pub proxied: bool,
    /// Emit the diagnostic stream
    pub diagnostics: bool,
    /// Create-or-update, or update only
    pub mode: WriteMode,
}

impl UpdateRequest {
    /// Check the preconditions that need no provider call
    ///
    /// # Returns
    ///
    /// - `Err(Error::MissingParameters)`: no credential, no domain, or more
    ///   than one domain in [`WriteMode::UpdateOnly`]
    /// - `Err(Error::NoValidAddress)`: neither candidate is valid
    pub fn validate(self) -> Result<ValidatedRequest> {
        let api_token = self
            .api_token
            .filter(|token| !token.is_empty())
            .ok_or(Error::MissingParameters)?;

        if self.domains.is_empty() {
            return Err(Error::MissingParameters);
        }
        if self.mode == WriteMode::UpdateOnly && self.domains.len() != 1 {
            return Err(Error::MissingParameters);
        }

        let addresses = AddressSet::from_candidates(self.ipv4.as_deref(), self.ipv6.as_deref());
        if addresses.is_empty() {
            return Err(Error::NoValidAddress);
        }

        Ok(ValidatedRequest {
            api_token,
            domains: self.domains,
            addresses,
            proxied: self.proxied,
            log: DiagnosticLog::new(self.diagnostics),
            mode: self.mode,
        })
    }
}

/// A request that passed every precondition not needing the provider
///
/// Custom Debug hides the credential.
#[derive(Clone)]
pub struct ValidatedRequest {
    api_token: String,
    /// Domains to reconcile, in order
    pub domains: Vec<String>,
    /// Valid addresses (at least one)
    pub addresses: AddressSet,
    /// Proxy flag
    pub proxied: bool,
    /// Diagnostic stream
    pub log: DiagnosticLog,
    /// Write mode
    pub mode: WriteMode,
}

impl ValidatedRequest {
    /// Credential to build the provider with
    pub fn api_token(&self) -> &str {
        &self.api_token
    }
}

impl std::fmt::Debug for ValidatedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedRequest")
            .field("api_token", &"<REDACTED>")
            .field("domains", &self.domains)
            .field("addresses", &self.addresses)
            .field("proxied", &self.proxied)
            .field("log", &self.log)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Batch orchestrator
///
/// Holds the provider capability for one invocation. Domains are processed
/// sequentially, in input order; there is no retry and no shared state
/// beyond the provider's own authentication context.
pub struct DdnsEngine {
    /// DNS provider for zone/record operations
    provider: Box<dyn DnsProvider>,

    /// TTL written on create/update
    ttl: u32,
}

impl DdnsEngine {
    /// Create a new engine around a provider
    pub fn new(provider: Box<dyn DnsProvider>, config: &EngineConfig) -> Self {
        Self {
            provider,
            ttl: config.ttl,
        }
    }

    /// Run one batch
    ///
    /// # Returns
    ///
    /// - `Ok(BatchReport)`: Every domain was attempted
    /// - `Err(Error::AuthenticationFailed)`: Probe failed, nothing processed
    /// - `Err(Error::RecordNotFound)`: Update-only request hit a missing record
    pub async fn run(&self, request: &ValidatedRequest) -> Result<BatchReport> {
        let log = request.log;
        log.info("===== Starting Script =====");
        log.info(format!(
            "Record will{} be proxied by {}",
            if request.proxied { "" } else { " not" },
            self.provider.provider_name()
        ));

        if let Err(e) = self.provider.authenticate().await {
            let error = if matches!(e, Error::AuthenticationFailed(_)) {
                e
            } else {
                Error::auth(e.to_string())
            };
            warn!("{} rejected credential: {}", self.provider.provider_name(), error);
            log.error(&error);
            log.info("Script aborted");
            return Err(error);
        }
        log.info(format!(
            "{} authentication successful",
            self.provider.provider_name()
        ));
        log.info(format!("Found records to set: {}", request.domains.join(",")));

        let started_at = Utc::now();
        let mut domains = Vec::with_capacity(request.domains.len());
        for domain in &request.domains {
            let outcome = self.reconcile_domain(domain, request).await;
            domains.push(DomainReport {
                domain: domain.clone(),
                outcome,
            });
        }

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            domains,
        };

        let counts = report.counts();
        info!(
            "Batch finished: {} ({} created, {} updated, {} skipped, {} failed) in {}ms",
            report.aggregate().as_str(),
            counts.created,
            counts.updated,
            counts.skipped,
            counts.failed,
            report.elapsed().num_milliseconds()
        );
        log.info("===== Script completed =====");

        if request.mode == WriteMode::UpdateOnly
            && let Some(name) = report.missing_record()
        {
            return Err(Error::RecordNotFound(name.to_string()));
        }

        Ok(report)
    }

    /// Resolve, list, and reconcile one domain
    async fn reconcile_domain(&self, domain: &str, request: &ValidatedRequest) -> DomainOutcome {
        let log = request.log;
        log.info(format!("Find zone for record '{}'", domain));

        let zone = match resolve_zone(self.provider.as_ref(), domain).await {
            Ok(zone) => zone,
            Err(e) => {
                debug!("Zone resolution failed for {}: {}", domain, e);
                match &e {
                    Error::InvalidDomain(_) => log.error(&e),
                    _ => log.error(format!(
                        "Could not set record '{}', could not determine zone id.",
                        domain
                    )),
                }
                return DomainOutcome::Failed(e);
            }
        };
        log.info(format!("Found zone id ({}) for '{}'.", zone.id, domain));

        let existing = match self.provider.list_records(&zone.id, domain).await {
            Ok(records) => records,
            Err(e) => {
                let error = Error::RecordLookupFailed {
                    name: domain.to_string(),
                    message: e.to_string(),
                };
                log.error(&error);
                return DomainOutcome::Failed(error);
            }
        };
        debug!("{} has {} address record(s)", domain, existing.len());

        if request.mode == WriteMode::UpdateOnly
            && let Some(record_type) = missing_family(&existing, domain, &request.addresses)
        {
            log.error(format!(
                "No {} record exists for '{}' and creation is disabled.",
                record_type, domain
            ));
            return DomainOutcome::Failed(Error::RecordNotFound(domain.to_string()));
        }

        let mut records = Vec::with_capacity(2);
        for (record_type, content) in request.addresses.entries() {
            let target = RecordTarget {
                zone_id: &zone.id,
                name: domain,
                record_type,
                content,
                proxied: request.proxied,
                ttl: self.ttl,
            };
            let outcome = reconcile_record(
                self.provider.as_ref(),
                &target,
                &existing,
                request.mode,
                log,
            )
            .await;
            records.push(RecordOutcome {
                record_type,
                outcome,
            });
        }

        DomainOutcome::Reconciled {
            zone_id: zone.id,
            records,
        }
    }
}

/// Validate, build a provider for the request's credential, and run
///
/// No provider is constructed (and so no provider call is made) unless the
/// request passes [`UpdateRequest::validate`].
pub async fn process_request(
    factory: &dyn DnsProviderFactory,
    config: &DdnsConfig,
    request: UpdateRequest,
) -> Result<BatchReport> {
    let log = DiagnosticLog::new(request.diagnostics);
    let request = request.validate().inspect_err(|e| {
        log.error(e);
        log.info("Script aborted");
    })?;

    let provider = factory.create(&config.provider, request.api_token())?;
    DdnsEngine::new(provider, &config.engine).run(&request).await
}
