//! Collector module
//!
//! This module groups everything needed to run one signal probe:
//! - The `SignalProbe` contract every producer implements
//! - Scheduling metadata (`CollectorDescriptor`, priority, category)
//! - The execution wrapper that races a probe against its timeout
//! - The registry indexing collector instances by id
//! - Construction helpers for closure-backed collectors
//!
//! Design notes:
//! - Probe-specific logic MUST NOT live here (see `signals`)
//! - Every failure mode ends up as a `CollectorResult`, never a panic
//!   or an `Err` escaping `Collector::collect`
pub mod factory;
pub mod registry;
pub mod runner;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::TelemetryRecord;

pub use registry::{CollectorRegistry, RegistryError};
pub use runner::Collector;

// ------------------------------------------------------------
// Category
// ------------------------------------------------------------
//
// Informational grouping only. Used for stats and as the
// tie-breaker when sorting collectors of equal priority.
//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectorCategory {
    Device,
    Browser,
    Fingerprinting,
    Media,
    Security,
    System,
    Network,
    Performance,
}

impl CollectorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorCategory::Device => "device",
            CollectorCategory::Browser => "browser",
            CollectorCategory::Fingerprinting => "fingerprinting",
            CollectorCategory::Media => "media",
            CollectorCategory::Security => "security",
            CollectorCategory::System => "system",
            CollectorCategory::Network => "network",
            CollectorCategory::Performance => "performance",
        }
    }
}

impl fmt::Display for CollectorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------------------------------------------------------
// Priority
// ------------------------------------------------------------
//
// Ordered from most to least critical. The numeric value drives
// `CollectorRegistry::get_sorted`, the default timeout grows
// monotonically with it.
//
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectorPriority {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
    Optional = 5,
}

impl CollectorPriority {
    /// Timeout applied when a descriptor carries no override.
    pub fn default_timeout(&self) -> Duration {
        match self {
            CollectorPriority::Critical => Duration::from_millis(1500),
            CollectorPriority::High => Duration::from_millis(2500),
            CollectorPriority::Medium => Duration::from_millis(4000),
            CollectorPriority::Low => Duration::from_millis(6000),
            CollectorPriority::Optional => Duration::from_millis(8000),
        }
    }

    pub fn value(&self) -> u8 {
        *self as u8
    }
}

// ------------------------------------------------------------
// Descriptor
// ------------------------------------------------------------

/// Identity and scheduling metadata of one collector.
///
/// Fixed once the collector is constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectorDescriptor {
    pub id: String,
    pub category: CollectorCategory,
    pub priority: CollectorPriority,

    /// Overrides the priority-based default timeout
    pub timeout: Option<Duration>,

    /// Reserved. Declared but not enforced as an execution order.
    pub dependencies: Vec<String>,
}

impl CollectorDescriptor {
    pub fn new(
        id: impl Into<String>,
        category: CollectorCategory,
        priority: CollectorPriority,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            priority,
            timeout: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// The override if set, otherwise the priority default.
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or_else(|| self.priority.default_timeout())
    }
}

// ------------------------------------------------------------
// Result
// ------------------------------------------------------------

/// Outcome of one collector execution.
///
/// `data` is present iff `success`, `error` iff not.
#[derive(Debug, Clone, Serialize)]
pub struct CollectorResult {
    pub success: bool,
    pub data: Option<TelemetryRecord>,
    pub error: Option<String>,
    pub execution_time: Duration,
    pub metadata: Option<BTreeMap<String, Value>>,
}

impl CollectorResult {
    pub fn success(data: TelemetryRecord, execution_time: Duration) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            execution_time,
            metadata: None,
        }
    }

    pub fn failure(error: &CollectorError, execution_time: Duration) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            execution_time,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }
}

/// Every way a collector can fail.
///
/// Flattened to its message at the collector boundary; the
/// orchestration layer treats all variants the same way.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Collector {id} is not supported in this environment")]
    Unsupported { id: String },

    #[error("Timeout after {ms}ms")]
    Timeout { ms: u128 },

    #[error("{0}")]
    Probe(String),

    #[error("Data validation failed for collector {id}")]
    Validation { id: String },
}

// ------------------------------------------------------------
// Hooks
// ------------------------------------------------------------

pub type Validator = Arc<dyn Fn(&TelemetryRecord) -> bool + Send + Sync>;
pub type Transformer =
    Arc<dyn Fn(TelemetryRecord) -> anyhow::Result<TelemetryRecord> + Send + Sync>;

/// Post-processing applied to a probe's output.
///
/// Both hooks are always present. The defaults are identity and
/// always-accept, so a probe without hooks keeps its own output.
/// Transformation runs before validation.
#[derive(Clone)]
pub struct ProbeHooks {
    pub validate: Validator,
    pub transform: Transformer,
}

impl Default for ProbeHooks {
    fn default() -> Self {
        Self {
            validate: Arc::new(|_: &TelemetryRecord| true),
            transform: Arc::new(|record: TelemetryRecord| Ok::<_, anyhow::Error>(record)),
        }
    }
}

impl ProbeHooks {
    pub fn with_validator<F>(mut self, validate: F) -> Self
    where
        F: Fn(&TelemetryRecord) -> bool + Send + Sync + 'static,
    {
        self.validate = Arc::new(validate);
        self
    }

    pub fn with_transformer<F>(mut self, transform: F) -> Self
    where
        F: Fn(TelemetryRecord) -> anyhow::Result<TelemetryRecord> + Send + Sync + 'static,
    {
        self.transform = Arc::new(transform);
        self
    }
}

impl fmt::Debug for ProbeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeHooks").finish_non_exhaustive()
    }
}

// ------------------------------------------------------------
// Probe contract
// ------------------------------------------------------------

/// SignalProbe is the seam between the generic collector runtime
/// and one environment signal.
///
/// Each implementation must:
/// - Describe itself (id, category, priority, optional timeout)
/// - Report cheaply whether the environment supports it
/// - Produce a partial `TelemetryRecord` holding only its own fields
///
/// THREAD SAFETY:
/// - Must be Send + Sync, instances are shared across tasks
///
#[async_trait::async_trait]
pub trait SignalProbe: Send + Sync {
    /// Identity and scheduling metadata, read once at construction.
    fn descriptor(&self) -> CollectorDescriptor;

    /// Capability check.
    ///
    /// CONTRACT:
    /// - Synchronous and side-effect free
    /// - Returns false instead of panicking when something is missing
    fn is_supported(&self) -> bool {
        true
    }

    /// Reads the signal.
    ///
    /// May suspend on I/O. Errors and panics are contained by the
    /// execution wrapper.
    async fn probe(&self) -> anyhow::Result<TelemetryRecord>;

    /// Validation and transformation hooks, read once at construction.
    fn hooks(&self) -> ProbeHooks {
        ProbeHooks::default()
    }
}
