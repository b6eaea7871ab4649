// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:      Configuration structs loaded from JSON
// - schema:      Strongly typed composite record
// - util:        Base-field probes and small helpers
// - collector:   Probe contract, execution wrapper, registry, factory
// - signals:     Built-in host probes (default collector set)
// - service:     Collection pass orchestration
// - fingerprint: Canonicalization and hashing of a record
// - metrics:     Process-wide diagnostic counters
//
pub mod collector;
pub mod config;
pub mod fingerprint;
pub mod metrics;
pub mod schema;
pub mod service;
pub mod signals;
pub mod util;

pub use collector::{
    Collector, CollectorCategory, CollectorDescriptor, CollectorPriority, CollectorRegistry,
    CollectorResult, ProbeHooks, RegistryError, SignalProbe,
};
pub use config::Config;
pub use fingerprint::{Fingerprint, HashAlgorithm};
pub use schema::TelemetryRecord;
pub use service::{Collection, CollectionRun, CollectorStats, TelemetryService};
