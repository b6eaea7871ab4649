use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Global runtime metrics for collection passes.
///
/// Purpose:
/// - Track how many passes ran
/// - Track collector outcomes (success / failure / timeout)
/// - Track abandoned probes whose late results were dropped
/// - Track field collisions between collectors
///
/// Design:
/// - Lock-free (Atomics)
/// - Diagnostic only, never read for control flow
#[derive(Default)]
pub struct RuntimeMetrics {
    // Passes
    pub passes_started: AtomicUsize,
    pub passes_completed: AtomicUsize,

    // Collector outcomes
    pub collectors_succeeded: AtomicUsize,
    pub collectors_failed: AtomicUsize,
    pub collectors_timed_out: AtomicUsize,
    pub late_results_discarded: AtomicUsize,

    // Merge
    pub field_collisions: AtomicUsize,
}

impl RuntimeMetrics {
    /// One-line summary used by the binary after a pass.
    pub fn summary(&self) -> String {
        format!(
            "[METRICS] passes={}/{} ok={} failed={} timeouts={} late_discarded={} collisions={}",
            self.passes_completed.load(Ordering::Relaxed),
            self.passes_started.load(Ordering::Relaxed),
            self.collectors_succeeded.load(Ordering::Relaxed),
            self.collectors_failed.load(Ordering::Relaxed),
            self.collectors_timed_out.load(Ordering::Relaxed),
            self.late_results_discarded.load(Ordering::Relaxed),
            self.field_collisions.load(Ordering::Relaxed),
        )
    }
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> =
    Lazy::new(|| Arc::new(RuntimeMetrics::default()));
