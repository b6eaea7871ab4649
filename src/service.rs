use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::{
    collector::{Collector, CollectorError, CollectorRegistry, CollectorResult, RegistryError},
    config::Config,
    fingerprint::{self, Fingerprint},
    metrics::METRICS,
    schema::TelemetryRecord,
    signals::default_collectors,
    util::{endianness_byte, generate_device_id, panic_message},
};

/// Diagnostic view of the registered collector set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorStats {
    pub total: usize,
    pub supported: usize,
    pub by_category: BTreeMap<String, usize>,
}

/// Result of one collector within a pass.
#[derive(Debug, Clone, Serialize)]
pub struct CollectorOutcome {
    pub id: String,
    pub result: CollectorResult,
}

/// Everything a pass produced, outcomes in merge order.
#[derive(Debug, Clone)]
pub struct CollectionRun {
    pub record: TelemetryRecord,
    pub results: Vec<CollectorOutcome>,
}

/// Final record paired with its fingerprint.
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    pub record: TelemetryRecord,
    pub fingerprint: Fingerprint,
}

/// Drives collection passes over the collectors of one registry.
///
/// Responsibilities:
/// - Own the registry and (re)populate it at construction
/// - Fan out every eligible collector concurrently
/// - Merge successful fragments in sorted order
/// - Reduce the merged record to a fingerprint
///
/// Registry mutation takes `&mut self`, so it cannot overlap a pass
/// (which borrows `&self`). Changes apply to the next pass only.
///
pub struct TelemetryService {
    registry: CollectorRegistry,
    config: Config,
}

impl TelemetryService {
    /// Takes ownership of `registry` and resets it to the built-in
    /// default collector set.
    pub fn new(config: Config, registry: CollectorRegistry) -> Result<Self, RegistryError> {
        Self::with_collectors(config, registry, default_collectors())
    }

    /// Same as `new`, with a caller-chosen collector set.
    pub fn with_collectors(
        config: Config,
        registry: CollectorRegistry,
        collectors: Vec<Collector>,
    ) -> Result<Self, RegistryError> {
        let mut service = Self { registry, config };
        service.reset_collectors(collectors)?;
        Ok(service)
    }

    /// Clears the registry and registers `collectors`. Not additive.
    ///
    /// A duplicate id in `collectors` is rejected before anything is
    /// cleared, leaving the current set in place.
    pub fn reset_collectors(&mut self, collectors: Vec<Collector>) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        if let Some(dup) = collectors.iter().find(|c| !seen.insert(c.id())) {
            return Err(RegistryError::Duplicate(dup.id().to_string()));
        }

        self.registry.clear();
        for collector in collectors {
            self.registry.register(collector)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &CollectorRegistry {
        &self.registry
    }

    // ------------------------------------------------------------
    // Collection pass
    // ------------------------------------------------------------

    /// Runs one pass and returns the merged record.
    pub async fn collect_telemetry_data(&self, id_length: usize) -> TelemetryRecord {
        self.run(id_length).await.record
    }

    /// Runs one pass, then reduces the record to its fingerprint.
    ///
    /// The fingerprint is also stored in the record's `fingerprint` field.
    pub async fn collect(&self, id_length: usize) -> Collection {
        let mut record = self.collect_telemetry_data(id_length).await;
        let fingerprint = self.fingerprint(&record);
        record.fingerprint = Some(fingerprint.to_string());

        Collection { record, fingerprint }
    }

    /// Fingerprint of `record` using the configured digest.
    pub fn fingerprint(&self, record: &TelemetryRecord) -> Fingerprint {
        fingerprint::compute(record, self.config.hash_algorithm)
    }

    /// Runs one pass and keeps every collector's outcome.
    ///
    /// GUARANTEES:
    /// - `results` has one entry per eligible collector, in sorted order
    /// - Wall time is bounded by the slowest collector's own timeout
    /// - No collector failure escapes; a fully degraded environment
    ///   still yields the base record
    ///
    pub async fn run(&self, id_length: usize) -> CollectionRun {
        METRICS.passes_started.fetch_add(1, Ordering::Relaxed);

        let mut record = self.base_record(id_length);
        let eligible = self.eligible_collectors();
        let log_progress = self.config.enable_logging;

        if log_progress {
            info!("Running {} supported collectors...", eligible.len());
        }

        // Settle-all: every collector runs as its own task and is awaited
        // to completion, a panicking task only costs its own slot.
        let tasks = eligible.iter().cloned().map(|collector| {
            tokio::spawn(async move {
                if log_progress {
                    info!("Running collector: {}", collector.id());
                }
                collector.collect().await
            })
        });
        let settled = join_all(tasks).await;

        let mut results = Vec::with_capacity(eligible.len());
        let mut written_by: HashMap<&'static str, String> = HashMap::new();

        for (collector, joined) in eligible.iter().zip(settled) {
            let id = collector.id().to_string();

            let result = match joined {
                Ok(result) => result,
                Err(join_err) => {
                    let reason = if join_err.is_panic() {
                        panic_message(join_err.into_panic().as_ref())
                    } else {
                        "collector task was cancelled".to_string()
                    };
                    if log_progress {
                        error!("Collector task {id} did not settle: {reason}");
                    }
                    CollectorResult::failure(&CollectorError::Probe(reason), Duration::ZERO)
                }
            };

            match result.data.as_ref().filter(|_| result.success) {
                Some(data) => {
                    for field in record.merge(data.clone()) {
                        if let Some(previous) = written_by.insert(field, id.clone()) {
                            METRICS.field_collisions.fetch_add(1, Ordering::Relaxed);
                            warn!("field {field} written by {previous} overwritten by {id}");
                        }
                    }
                    METRICS.collectors_succeeded.fetch_add(1, Ordering::Relaxed);
                    if log_progress {
                        info!("✓ {id}: {:.2}ms", result.execution_time.as_secs_f64() * 1000.0);
                    }
                }
                None => {
                    METRICS.collectors_failed.fetch_add(1, Ordering::Relaxed);
                    if log_progress {
                        warn!("✗ {id}: {}", result.error.as_deref().unwrap_or("no data"));
                    }
                }
            }

            results.push(CollectorOutcome { id, result });
        }

        METRICS.passes_completed.fetch_add(1, Ordering::Relaxed);
        debug!("pass finished, fields: {:?}", record.populated_fields());

        CollectionRun { record, results }
    }

    /// Sorted collectors that are supported right now.
    fn eligible_collectors(&self) -> Vec<Arc<Collector>> {
        let supported: HashSet<String> = self
            .registry
            .get_supported()
            .iter()
            .map(|c| c.id().to_string())
            .collect();

        self.registry
            .get_sorted()
            .into_iter()
            .filter(|c| supported.contains(c.id()))
            .collect()
    }

    /// Synchronous fields present in every record.
    fn base_record(&self, id_length: usize) -> TelemetryRecord {
        TelemetryRecord {
            stored_website_data: Some(Vec::new()),
            indexed_db_keys: Some(Vec::new()),
            endianness_byte: Some(endianness_byte()),
            incognito_detected: Some(false),
            device_id: Some(generate_device_id(id_length)),
            ..Default::default()
        }
    }

    // ------------------------------------------------------------
    // Collector set
    // ------------------------------------------------------------

    /// Registers a collector for subsequent passes.
    pub fn add_collector(&mut self, collector: Collector) -> Result<(), RegistryError> {
        self.registry.register(collector)
    }

    /// Unregisters a collector for subsequent passes.
    pub fn remove_collector(&mut self, id: &str) -> bool {
        self.registry.unregister(id)
    }

    pub fn get_collector(&self, id: &str) -> Option<Arc<Collector>> {
        self.registry.get(id)
    }

    pub fn get_all_collectors(&self) -> Vec<Arc<Collector>> {
        self.registry.get_all()
    }

    pub fn get_supported_collectors(&self) -> Vec<Arc<Collector>> {
        self.registry.get_supported()
    }

    pub fn get_collector_stats(&self) -> CollectorStats {
        let all = self.registry.get_all();
        let mut by_category = BTreeMap::new();
        for collector in &all {
            *by_category
                .entry(collector.category().as_str().to_string())
                .or_insert(0) += 1;
        }

        CollectorStats {
            total: all.len(),
            supported: self.registry.get_supported().len(),
            by_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::factory::{self, SimpleCollectorConfig};
    use crate::collector::{CollectorCategory, CollectorPriority};

    fn fixed(id: &str, record: TelemetryRecord) -> Collector {
        factory::simple(SimpleCollectorConfig::new(id, CollectorCategory::Device, move || {
            let record = record.clone();
            async move { Ok(record) }
        }))
    }

    #[test]
    fn construction_installs_the_default_set() {
        let service = TelemetryService::new(Config::default(), CollectorRegistry::new()).unwrap();
        let ids: Vec<String> = service
            .get_all_collectors()
            .iter()
            .map(|c| c.id().to_string())
            .collect();

        assert_eq!(ids, vec!["user-agent", "platform-info", "locale", "automation-detection"]);
    }

    #[test]
    fn construction_resets_instead_of_adding() {
        let mut registry = CollectorRegistry::new();
        registry.register(fixed("stale", TelemetryRecord::default())).unwrap();

        let service = TelemetryService::new(Config::default(), registry).unwrap();

        assert!(service.get_collector("stale").is_none());
        assert_eq!(service.registry().size(), default_collectors().len());
    }

    #[tokio::test]
    async fn empty_registry_yields_the_base_record() {
        let service =
            TelemetryService::with_collectors(Config::default(), CollectorRegistry::new(), vec![])
                .unwrap();

        let run = service.run(12).await;

        assert!(run.results.is_empty());
        let record = run.record;
        assert_eq!(record.stored_website_data, Some(vec![]));
        assert_eq!(record.indexed_db_keys, Some(vec![]));
        assert_eq!(record.incognito_detected, Some(false));
        assert!(record.endianness_byte.is_some());
        assert_eq!(record.device_id.map(|id| id.len()), Some(12));
    }

    #[tokio::test]
    async fn collectors_may_override_base_fields() {
        let incognito = fixed(
            "private-mode",
            TelemetryRecord {
                incognito_detected: Some(true),
                ..Default::default()
            },
        );
        let service = TelemetryService::with_collectors(
            Config::default(),
            CollectorRegistry::new(),
            vec![incognito],
        )
        .unwrap();

        let record = service.collect_telemetry_data(32).await;

        assert_eq!(record.incognito_detected, Some(true));
    }

    #[tokio::test]
    async fn collect_stores_the_fingerprint_in_the_record() {
        let service = TelemetryService::new(Config::default(), CollectorRegistry::new()).unwrap();

        let collection = service.collect(32).await;

        assert_eq!(
            collection.record.fingerprint.as_deref(),
            Some(collection.fingerprint.as_str())
        );
        assert_eq!(service.fingerprint(&collection.record), collection.fingerprint);
    }

    #[test]
    fn rejected_reset_keeps_the_current_set() {
        let mut service =
            TelemetryService::new(Config::default(), CollectorRegistry::new()).unwrap();

        let err = service
            .reset_collectors(vec![
                fixed("a", TelemetryRecord::default()),
                fixed("a", TelemetryRecord::default()),
            ])
            .unwrap_err();

        assert_eq!(err, RegistryError::Duplicate("a".to_string()));
        assert!(service.get_collector("a").is_none());
        assert_eq!(service.registry().size(), default_collectors().len());
    }

    #[test]
    fn mutations_go_through_the_registry() {
        let mut service =
            TelemetryService::with_collectors(Config::default(), CollectorRegistry::new(), vec![])
                .unwrap();

        service.add_collector(fixed("a", TelemetryRecord::default())).unwrap();
        assert!(service.add_collector(fixed("a", TelemetryRecord::default())).is_err());
        assert!(service.get_collector("a").is_some());
        assert!(service.remove_collector("a"));
        assert!(!service.remove_collector("a"));

        service
            .add_collector(factory::simple(
                SimpleCollectorConfig::new("b", CollectorCategory::Media, || async {
                    Ok(TelemetryRecord::default())
                })
                .priority(CollectorPriority::Low)
                .support_check(|| false),
            ))
            .unwrap();
        assert_eq!(service.get_all_collectors().len(), 1);
        assert!(service.get_supported_collectors().is_empty());
    }
}
