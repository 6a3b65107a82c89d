//! Contract Test: Idempotent Upsert
//!
//! Constraints verified:
//! - Equal content means no write call at all
//! - Differing content means exactly one update, keeping the record id
//! - A missing record means exactly one create
//! - Re-running the same request after a create is a no-op
//!
//! If this test fails, the reconciler is issuing redundant writes.

mod common;

use common::*;
use ddns_reconciler::engine::{DomainOutcome, Outcome};
use ddns_reconciler::{AggregateResult, DdnsConfig, RecordType, process_request};

fn outcomes(report: &ddns_reconciler::BatchReport) -> Vec<(RecordType, &Outcome)> {
    report
        .domains
        .iter()
        .flat_map(|d| match &d.outcome {
            DomainOutcome::Reconciled { records, .. } => records
                .iter()
                .map(|r| (r.record_type, &r.outcome))
                .collect::<Vec<_>>(),
            DomainOutcome::Failed(e) => panic!("domain {} failed: {}", d.domain, e),
        })
        .collect()
}

#[tokio::test]
async fn same_request_twice_creates_then_skips() {
    let provider = FakeProvider::new().with_zone("zone-1", "example.com");
    let factory = FakeFactory::new(provider.clone());
    let config = DdnsConfig::default();

    let first = process_request(&factory, &config, ipv4_request(&["home.example.com"], "1.2.3.4"))
        .await
        .expect("first run succeeds");
    assert!(matches!(outcomes(&first)[..], [(RecordType::A, Outcome::Created)]));
    assert_eq!(first.aggregate(), AggregateResult::Success);
    assert_eq!(provider.writes().len(), 1);

    let second = process_request(&factory, &config, ipv4_request(&["home.example.com"], "1.2.3.4"))
        .await
        .expect("second run succeeds");
    assert!(matches!(outcomes(&second)[..], [(RecordType::A, Outcome::Skipped)]));
    assert_eq!(second.aggregate(), AggregateResult::Success);

    assert_eq!(
        provider.writes().len(),
        1,
        "second run must not issue a write"
    );
}

#[tokio::test]
async fn differing_content_issues_exactly_one_update() {
    let provider = FakeProvider::new()
        .with_zone("zone-1", "example.com")
        .with_record("zone-1", RecordType::A, "home.example.com", "5.6.7.8");
    let existing_id = provider.records_named("home.example.com")[0].id.clone();
    let factory = FakeFactory::new(provider.clone());

    let mut request = ipv4_request(&["home.example.com"], "1.2.3.4");
    request.proxied = true;
    let report = process_request(&factory, &DdnsConfig::default(), request)
        .await
        .unwrap();

    assert!(matches!(outcomes(&report)[..], [(RecordType::A, Outcome::Updated)]));

    let writes = provider.writes();
    assert_eq!(writes.len(), 1);
    match &writes[0] {
        Call::Update {
            zone_id,
            record_id,
            record,
        } => {
            assert_eq!(zone_id, "zone-1");
            assert_eq!(record_id, &existing_id);
            assert_eq!(record.name, "home.example.com");
            assert_eq!(record.content, "1.2.3.4");
            assert_eq!(record.ttl, 1, "TTL is the automatic sentinel");
            assert!(record.proxied);
        }
        other => panic!("expected update, got {other:?}"),
    }

    let records = provider.records_named("home.example.com");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, "1.2.3.4");
}

#[tokio::test]
async fn missing_record_issues_exactly_one_create() {
    let provider = FakeProvider::new().with_zone("zone-1", "example.com");
    let factory = FakeFactory::new(provider.clone());

    let report = process_request(
        &factory,
        &DdnsConfig::default(),
        ipv4_request(&["home.example.com"], "1.2.3.4"),
    )
    .await
    .unwrap();

    assert!(matches!(outcomes(&report)[..], [(RecordType::A, Outcome::Created)]));

    let writes = provider.writes();
    assert_eq!(writes.len(), 1);
    match &writes[0] {
        Call::Create { zone_id, record } => {
            assert_eq!(zone_id, "zone-1");
            assert_eq!(record.record_type, RecordType::A);
            assert_eq!(record.content, "1.2.3.4");
            assert_eq!(record.ttl, 1);
            assert!(!record.proxied);
        }
        other => panic!("expected create, got {other:?}"),
    }
}

#[tokio::test]
async fn both_families_share_one_record_listing() {
    let provider = FakeProvider::new()
        .with_zone("zone-1", "example.com")
        .with_record("zone-1", RecordType::A, "home.example.com", "1.2.3.4");
    let factory = FakeFactory::new(provider.clone());

    let mut request = ipv4_request(&["home.example.com"], "1.2.3.4");
    request.ipv6 = Some("2001:db8::1".to_string());
    let report = process_request(&factory, &DdnsConfig::default(), request)
        .await
        .unwrap();

    assert!(matches!(
        outcomes(&report)[..],
        [
            (RecordType::A, Outcome::Skipped),
            (RecordType::Aaaa, Outcome::Created)
        ]
    ));

    let listings = provider
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::ListRecords { .. }))
        .count();
    assert_eq!(listings, 1, "records are fetched once per domain");
}

#[tokio::test]
async fn configured_ttl_is_written() {
    let provider = FakeProvider::new().with_zone("zone-1", "example.com");
    let factory = FakeFactory::new(provider.clone());
    let mut config = DdnsConfig::default();
    config.engine.ttl = 120;

    process_request(&factory, &config, ipv4_request(&["home.example.com"], "1.2.3.4"))
        .await
        .unwrap();

    match &provider.writes()[0] {
        Call::Create { record, .. } => assert_eq!(record.ttl, 120),
        other => panic!("expected create, got {other:?}"),
    }
}
