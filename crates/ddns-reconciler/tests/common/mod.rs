//! Test doubles and common utilities for reconciliation contract tests
//!
//! `FakeProvider` is an in-memory provider that records every call. It is
//! cheaply cloneable; clones share state, so a test can hand one clone to
//! the engine and inspect the other afterwards.

#![allow(dead_code)]

use ddns_reconciler::config::ProviderConfig;
use ddns_reconciler::error::{Error, Result};
use ddns_reconciler::traits::{
    DnsProvider, DnsProviderFactory, DnsRecord, RecordRequest, Zone, ZoneStatus,
};
use ddns_reconciler::{RecordType, UpdateRequest};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A provider call, as observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Authenticate,
    ListZones(String),
    ListRecords { zone_id: String, name: String },
    Create { zone_id: String, record: RecordRequest },
    Update {
        zone_id: String,
        record_id: String,
        record: RecordRequest,
    },
}

impl Call {
    pub fn is_write(&self) -> bool {
        matches!(self, Call::Create { .. } | Call::Update { .. })
    }
}

#[derive(Default)]
struct FakeState {
    zones: Vec<Zone>,
    records: Vec<(String, DnsRecord)>,
    reject_auth: bool,
    reject_writes: bool,
    failing_record_lists: HashSet<String>,
    calls: Vec<Call>,
    next_id: usize,
}

/// In-memory provider tracking calls
#[derive(Clone, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active zone
    pub fn with_zone(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
            status: "active".to_string(),
        });
        self
    }

    /// Add a zone in a non-active state
    pub fn with_pending_zone(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
            status: "pending".to_string(),
        });
        self
    }

    /// Add an existing record
    pub fn with_record(
        self,
        zone_id: &str,
        record_type: RecordType,
        name: &str,
        content: &str,
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = format!("rec-{}", state.next_id);
            state.records.push((
                zone_id.to_string(),
                DnsRecord {
                    id,
                    record_type,
                    name: name.to_string(),
                    content: content.to_string(),
                    ttl: 300,
                    proxied: false,
                },
            ));
        }
        self
    }

    /// Reject the authentication probe
    pub fn rejecting_auth(self) -> Self {
        self.state.lock().unwrap().reject_auth = true;
        self
    }

    /// Reject every create/update
    pub fn rejecting_writes(self) -> Self {
        self.state.lock().unwrap().reject_writes = true;
        self
    }

    /// Fail record listing for one name
    pub fn failing_record_list(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_record_lists
            .insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    /// Current records for a name
    pub fn records_named(&self, name: &str) -> Vec<DnsRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|(_, r)| r.name == name)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn boxed(&self) -> Box<dyn DnsProvider> {
        Box::new(self.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for FakeProvider {
    async fn authenticate(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Authenticate);
        if state.reject_auth {
            return Err(Error::auth("Invalid API Token"));
        }
        Ok(())
    }

    async fn list_zones(&self, name: &str, status: ZoneStatus) -> Result<Vec<Zone>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListZones(name.to_string()));
        Ok(state
            .zones
            .iter()
            .filter(|z| z.name == name && z.status == status.as_str())
            .cloned()
            .collect())
    }

    async fn list_records(&self, zone_id: &str, name: &str) -> Result<Vec<DnsRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListRecords {
            zone_id: zone_id.to_string(),
            name: name.to_string(),
        });
        if state.failing_record_lists.contains(name) {
            return Err(Error::provider("fake", "record listing unavailable"));
        }
        Ok(state
            .records
            .iter()
            .filter(|(z, r)| z == zone_id && r.name == name)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create_record(&self, zone_id: &str, record: &RecordRequest) -> Result<DnsRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create {
            zone_id: zone_id.to_string(),
            record: record.clone(),
        });
        if state.reject_writes {
            return Err(Error::provider("fake", "write rejected"));
        }

        state.next_id += 1;
        let created = DnsRecord {
            id: format!("rec-{}", state.next_id),
            record_type: record.record_type,
            name: record.name.clone(),
            content: record.content.clone(),
            ttl: record.ttl,
            proxied: record.proxied,
        };
        state.records.push((zone_id.to_string(), created.clone()));
        Ok(created)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordRequest,
    ) -> Result<DnsRecord> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            record: record.clone(),
        });
        if state.reject_writes {
            return Err(Error::provider("fake", "write rejected"));
        }

        let (_, existing) = state
            .records
            .iter_mut()
            .find(|(z, r)| z == zone_id && r.id == record_id)
            .ok_or_else(|| Error::provider("fake", "no such record"))?;
        existing.content = record.content.clone();
        existing.ttl = record.ttl;
        existing.proxied = record.proxied;
        Ok(existing.clone())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Factory handing out clones of one fake, counting constructions
#[derive(Clone)]
pub struct FakeFactory {
    pub provider: FakeProvider,
    created: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new(provider: FakeProvider) -> Self {
        Self {
            provider,
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl DnsProviderFactory for FakeFactory {
    fn create(&self, _config: &ProviderConfig, _api_token: &str) -> Result<Box<dyn DnsProvider>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self.provider.boxed())
    }
}

/// A request for the given domains with an IPv4 address
pub fn ipv4_request(domains: &[&str], ipv4: &str) -> UpdateRequest {
    UpdateRequest {
        api_token: Some("test-token".to_string()),
        domains: domains.iter().map(|d| d.to_string()).collect(),
        ipv4: Some(ipv4.to_string()),
        ..Default::default()
    }
}
