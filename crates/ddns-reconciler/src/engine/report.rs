//! Per-domain outcomes and their fold into one aggregate result

use crate::address::RecordType;
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of reconciling one (domain, family) pair
#[derive(Debug)]
pub enum Outcome {
    /// Existing record already carried the address; no call made
    Skipped,
    /// Record did not exist and was created
    Created,
    /// Record existed with other content and was updated
    Updated,
    /// Decision or write failed
    Failed(Error),
}

impl Outcome {
    /// Whether this outcome downgrades the aggregate
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Outcome for one record type of a domain
#[derive(Debug)]
pub struct RecordOutcome {
    /// Record type reconciled
    pub record_type: RecordType,
    /// What happened
    pub outcome: Outcome,
}

/// Outcome for one domain
#[derive(Debug)]
pub enum DomainOutcome {
    /// Zone resolved and records listed; per-family outcomes follow
    Reconciled {
        /// Resolved zone id
        zone_id: String,
        /// One entry per address family present in the request
        records: Vec<RecordOutcome>,
    },
    /// Domain failed before any family was reconciled
    Failed(Error),
}

/// Report entry for one requested domain
#[derive(Debug)]
pub struct DomainReport {
    /// Domain name as requested
    pub domain: String,
    /// What happened
    pub outcome: DomainOutcome,
}

impl DomainReport {
    /// Whether anything about this domain failed
    pub fn is_failed(&self) -> bool {
        match &self.outcome {
            DomainOutcome::Failed(_) => true,
            DomainOutcome::Reconciled { records, .. } => {
                records.iter().any(|r| r.outcome.is_failed())
            }
        }
    }

    /// Iterate over every error recorded for this domain
    pub fn errors(&self) -> Box<dyn Iterator<Item = &Error> + '_> {
        match &self.outcome {
            DomainOutcome::Failed(e) => Box::new(std::iter::once(e)),
            DomainOutcome::Reconciled { records, .. } => {
                Box::new(records.iter().filter_map(|r| match &r.outcome {
                    Outcome::Failed(e) => Some(e),
                    _ => None,
                }))
            }
        }
    }
}

/// Single success/failure summary of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateResult {
    /// Every outcome was skipped, created, or updated
    Success,
    /// At least one outcome failed
    Failure,
}

impl AggregateResult {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateResult::Success => "success",
            AggregateResult::Failure => "failure",
        }
    }
}

/// Outcome counts, used for the completion log line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub skipped: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Everything one batch did
#[derive(Debug)]
pub struct BatchReport {
    /// When domain processing began
    pub started_at: DateTime<Utc>,
    /// When the last domain finished
    pub finished_at: DateTime<Utc>,
    /// One entry per requested domain, in input order
    pub domains: Vec<DomainReport>,
}

impl BatchReport {
    /// Fold all outcomes into the aggregate result
    pub fn aggregate(&self) -> AggregateResult {
        if self.domains.iter().any(DomainReport::is_failed) {
            AggregateResult::Failure
        } else {
            AggregateResult::Success
        }
    }

    /// Count outcomes by kind; a failed domain counts as one failure
    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for domain in &self.domains {
            match &domain.outcome {
                DomainOutcome::Failed(_) => counts.failed += 1,
                DomainOutcome::Reconciled { records, .. } => {
                    for record in records {
                        match record.outcome {
                            Outcome::Skipped => counts.skipped += 1,
                            Outcome::Created => counts.created += 1,
                            Outcome::Updated => counts.updated += 1,
                            Outcome::Failed(_) => counts.failed += 1,
                        }
                    }
                }
            }
        }
        counts
    }

    /// Name of the first record that was missing, if any
    pub fn missing_record(&self) -> Option<&str> {
        self.domains.iter().flat_map(DomainReport::errors).find_map(|e| match e {
            Error::RecordNotFound(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Elapsed wall time of the batch
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.signed_duration_since(self.started_at)
    }
}
