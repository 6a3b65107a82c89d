//! Contract Test: Per-Domain Failure Isolation
//!
//! Constraints verified:
//! - A domain that fails (bad name, no zone, rejected write) never stops the batch
//! - Later domains are still processed and recorded independently
//! - Any failure downgrades the aggregate to "failure"
//! - Domains are processed in input order
//!
//! If this test fails, one bad domain can take down a whole batch.

mod common;

use common::*;
use ddns_reconciler::engine::{DomainOutcome, Outcome};
use ddns_reconciler::{AggregateResult, DdnsConfig, Error, RecordType, process_request};

#[tokio::test]
async fn zone_failure_on_first_domain_does_not_stop_second() {
    // Only b's parent zone exists under a different name
    let provider = FakeProvider::new().with_zone("zone-b", "example.org");
    let factory = FakeFactory::new(provider.clone());

    let report = process_request(
        &factory,
        &DdnsConfig::default(),
        ipv4_request(&["a.example.com", "b.example.org"], "1.2.3.4"),
    )
    .await
    .expect("batch completes");

    assert_eq!(report.aggregate(), AggregateResult::Failure);
    assert_eq!(report.domains.len(), 2);

    assert_eq!(report.domains[0].domain, "a.example.com");
    assert!(matches!(
        &report.domains[0].outcome,
        DomainOutcome::Failed(Error::ZoneNotFound(d)) if d == "a.example.com"
    ));

    assert_eq!(report.domains[1].domain, "b.example.org");
    match &report.domains[1].outcome {
        DomainOutcome::Reconciled { zone_id, records } => {
            assert_eq!(zone_id, "zone-b");
            assert!(matches!(records[0].outcome, Outcome::Created));
        }
        other => panic!("second domain should be reconciled, got {other:?}"),
    }

    assert_eq!(provider.records_named("b.example.org").len(), 1);
}

#[tokio::test]
async fn same_zone_name_resolution_failure_is_isolated_per_domain() {
    // a.example.com and b.example.com share a candidate; here the zone is
    // pending for the whole run, so both fail but both are attempted
    let provider = FakeProvider::new().with_pending_zone("zone-1", "example.com");
    let factory = FakeFactory::new(provider.clone());

    let report = process_request(
        &factory,
        &DdnsConfig::default(),
        ipv4_request(&["a.example.com", "b.example.com"], "1.2.3.4"),
    )
    .await
    .unwrap();

    assert_eq!(report.aggregate(), AggregateResult::Failure);
    let zone_lookups = provider
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::ListZones(name) if name == "example.com"))
        .count();
    assert_eq!(zone_lookups, 2, "zones are looked up fresh per domain");
}

#[tokio::test]
async fn single_label_domain_is_invalid_without_writes() {
    let provider = FakeProvider::new().with_zone("zone-1", "example.com");
    let factory = FakeFactory::new(provider.clone());

    let report = process_request(
        &factory,
        &DdnsConfig::default(),
        ipv4_request(&["localhost", "home.example.com"], "1.2.3.4"),
    )
    .await
    .unwrap();

    assert!(matches!(
        &report.domains[0].outcome,
        DomainOutcome::Failed(Error::InvalidDomain(d)) if d == "localhost"
    ));
    assert!(
        !provider
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ListZones(name) if name == "localhost")),
        "invalid domains never reach the provider"
    );

    // Only the valid domain was written
    let writes = provider.writes();
    assert_eq!(writes.len(), 1);
    assert!(matches!(&writes[0], Call::Create { record, .. } if record.name == "home.example.com"));
    assert_eq!(report.aggregate(), AggregateResult::Failure);
}

#[tokio::test]
async fn rejected_write_fails_only_that_family() {
    let provider = FakeProvider::new()
        .with_zone("zone-1", "example.com")
        .with_record("zone-1", RecordType::Aaaa, "home.example.com", "2001:db8::1")
        .rejecting_writes();
    let factory = FakeFactory::new(provider.clone());

    let mut request = ipv4_request(&["home.example.com"], "1.2.3.4");
    request.ipv6 = Some("2001:db8::1".to_string());
    let report = process_request(&factory, &DdnsConfig::default(), request)
        .await
        .unwrap();

    match &report.domains[0].outcome {
        DomainOutcome::Reconciled { records, .. } => {
            assert!(matches!(
                &records[0].outcome,
                Outcome::Failed(Error::RecordWriteFailed { action: "create", record_type: "A", .. })
            ));
            assert!(matches!(records[1].outcome, Outcome::Skipped));
        }
        other => panic!("expected reconciled domain, got {other:?}"),
    }
    assert_eq!(report.aggregate(), AggregateResult::Failure);
}

#[tokio::test]
async fn ambiguous_records_fail_without_writes() {
    let provider = FakeProvider::new()
        .with_zone("zone-1", "example.com")
        .with_record("zone-1", RecordType::A, "home.example.com", "5.6.7.8")
        .with_record("zone-1", RecordType::A, "home.example.com", "9.9.9.9");
    let factory = FakeFactory::new(provider.clone());

    let report = process_request(
        &factory,
        &DdnsConfig::default(),
        ipv4_request(&["home.example.com"], "1.2.3.4"),
    )
    .await
    .unwrap();

    match &report.domains[0].outcome {
        DomainOutcome::Reconciled { records, .. } => assert!(matches!(
            &records[0].outcome,
            Outcome::Failed(Error::AmbiguousRecord { count: 2, .. })
        )),
        other => panic!("expected reconciled domain, got {other:?}"),
    }
    assert!(provider.writes().is_empty());
    assert_eq!(report.aggregate(), AggregateResult::Failure);
}

#[tokio::test]
async fn record_listing_failure_fails_domain_without_blind_create() {
    let provider = FakeProvider::new()
        .with_zone("zone-1", "example.com")
        .failing_record_list("a.example.com");
    let factory = FakeFactory::new(provider.clone());

    let report = process_request(
        &factory,
        &DdnsConfig::default(),
        ipv4_request(&["a.example.com", "b.example.com"], "1.2.3.4"),
    )
    .await
    .unwrap();

    assert!(matches!(
        &report.domains[0].outcome,
        DomainOutcome::Failed(Error::RecordLookupFailed { .. })
    ));
    assert!(!report.domains[1].is_failed());

    let writes = provider.writes();
    assert_eq!(writes.len(), 1);
    assert!(matches!(&writes[0], Call::Create { record, .. } if record.name == "b.example.com"));
}

#[tokio::test]
async fn domains_are_processed_in_input_order() {
    let provider = FakeProvider::new()
        .with_zone("zone-1", "example.com")
        .with_zone("zone-2", "example.net");
    let factory = FakeFactory::new(provider.clone());

    process_request(
        &factory,
        &DdnsConfig::default(),
        ipv4_request(&["z.example.net", "a.example.com"], "1.2.3.4"),
    )
    .await
    .unwrap();

    let created: Vec<String> = provider
        .writes()
        .into_iter()
        .filter_map(|c| match c {
            Call::Create { record, .. } => Some(record.name),
            _ => None,
        })
        .collect();
    assert_eq!(created, vec!["z.example.net", "a.example.com"]);
}
