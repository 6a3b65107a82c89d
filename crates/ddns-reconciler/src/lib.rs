// # ddns-reconciler
//
// Stateless dynamic DNS reconciliation.
//
// Given a list of domains and the caller's current public IPv4/IPv6
// addresses, make each domain's A/AAAA records at the DNS provider match,
// creating or updating records only when they differ. Nothing is kept
// between invocations: current state is always re-read from the provider.
//
// ## Architecture Overview
//
// - **address**: Syntactic validation of candidate addresses
// - **DnsProvider**: Trait for zone/record operations via provider APIs
// - **zone**: Domain → zone resolution
// - **engine::record**: Skip/create/update decision for one record
// - **DdnsEngine**: Batch orchestration and result aggregation
// - **ProviderRegistry**: Plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Injected capability**: The provider is passed in, never global
// 2. **Pure decisions**: Record matching is a function of fetched records
// 3. **Failure isolation**: One domain's failure never stops the batch
// 4. **Idempotency**: Equal content means no write

pub mod address;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod registry;
pub mod traits;
pub mod zone;

// Re-export core types for convenience
pub use address::{AddressSet, RecordType, validate_ipv4, validate_ipv6};
pub use config::{DdnsConfig, EngineConfig, ProviderConfig};
pub use diagnostics::DiagnosticLog;
pub use engine::{
    AggregateResult, BatchReport, DdnsEngine, Outcome, UpdateRequest, WriteMode, process_request,
};
pub use error::{Error, Result};
pub use registry::ProviderRegistry;
pub use traits::{DnsProvider, DnsProviderFactory};
