use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use super::{Collector, CollectorCategory, CollectorPriority};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Collector with ID {0} is already registered")]
    Duplicate(String),
}

/// Catalog of collector instances keyed by id.
///
/// One registry belongs to one `TelemetryService` for its whole
/// lifetime. Mutation needs `&mut self`, so it can only happen between
/// passes, never while a batch is in flight.
///
/// Insertion order is preserved; `get_all` and the stable sort in
/// `get_sorted` depend on it.
#[derive(Debug, Default)]
pub struct CollectorRegistry {
    collectors: IndexMap<String, Arc<Collector>>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collector. A duplicate id is rejected and leaves the
    /// registry untouched.
    pub fn register(&mut self, collector: Collector) -> Result<(), RegistryError> {
        let id = collector.id().to_string();
        if self.collectors.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }
        self.collectors.insert(id, Arc::new(collector));
        Ok(())
    }

    /// Removes a collector, reporting whether it was present.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.collectors.shift_remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Collector>> {
        self.collectors.get(id).cloned()
    }

    pub fn get_all(&self) -> Vec<Arc<Collector>> {
        self.collectors.values().cloned().collect()
    }

    pub fn get_by_category(&self, category: CollectorCategory) -> Vec<Arc<Collector>> {
        self.collectors
            .values()
            .filter(|c| c.category() == category)
            .cloned()
            .collect()
    }

    pub fn get_by_priority(&self, priority: CollectorPriority) -> Vec<Arc<Collector>> {
        self.collectors
            .values()
            .filter(|c| c.priority() == priority)
            .cloned()
            .collect()
    }

    /// Collectors whose capability check passes right now.
    pub fn get_supported(&self) -> Vec<Arc<Collector>> {
        self.collectors
            .values()
            .filter(|c| c.is_supported())
            .cloned()
            .collect()
    }

    /// Ascending priority, ties broken by category name.
    ///
    /// This is the merge order of a collection pass: on a field
    /// collision the collector later in this order wins.
    pub fn get_sorted(&self) -> Vec<Arc<Collector>> {
        let mut sorted = self.get_all();
        sorted.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.category().as_str().cmp(b.category().as_str()))
        });
        sorted
    }

    pub fn clear(&mut self) {
        self.collectors.clear();
    }

    pub fn has(&self, id: &str) -> bool {
        self.collectors.contains_key(id)
    }

    pub fn size(&self) -> usize {
        self.collectors.len()
    }
}
