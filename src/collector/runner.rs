use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::task::JoinError;
use tokio::time::{sleep, Instant};

use crate::{
    collector::{
        CollectorCategory, CollectorDescriptor, CollectorError, CollectorPriority,
        CollectorResult, ProbeHooks, SignalProbe,
    },
    metrics::METRICS,
    schema::TelemetryRecord,
    util::panic_message,
};

/// Execution wrapper around one `SignalProbe`.
///
/// This is what the registry stores and what the service schedules.
///
/// GUARANTEES:
/// - `collect` never panics and never returns early with an error
/// - Every failure (unsupported, timeout, probe error or panic,
///   hook panic, rejected by validator) becomes a failed `CollectorResult`
///
/// NOT RESPONSIBLE FOR:
/// - Merging output into the composite record
/// - Deciding which collectors run
///
pub struct Collector {
    descriptor: CollectorDescriptor,
    probe: Arc<dyn SignalProbe>,
    hooks: ProbeHooks,
}

impl Collector {
    /// Wraps a probe using the descriptor it reports about itself.
    pub fn new(probe: impl SignalProbe + 'static) -> Self {
        let descriptor = probe.descriptor();
        Self::with_descriptor(descriptor, probe)
    }

    /// Wraps a probe under an explicit descriptor.
    pub fn with_descriptor(
        descriptor: CollectorDescriptor,
        probe: impl SignalProbe + 'static,
    ) -> Self {
        let hooks = probe.hooks();
        Self {
            descriptor,
            probe: Arc::new(probe),
            hooks,
        }
    }

    pub fn descriptor(&self) -> &CollectorDescriptor {
        &self.descriptor
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn category(&self) -> CollectorCategory {
        self.descriptor.category
    }

    pub fn priority(&self) -> CollectorPriority {
        self.descriptor.priority
    }

    /// Live capability check, never cached. A panicking check counts
    /// as unsupported.
    pub fn is_supported(&self) -> bool {
        let probe = &self.probe;
        panic::catch_unwind(AssertUnwindSafe(|| probe.is_supported())).unwrap_or_else(|payload| {
            debug!(
                "collector {} support check panicked: {}",
                self.descriptor.id,
                panic_message(payload.as_ref())
            );
            false
        })
    }

    /// Runs the probe and converts every outcome into a `CollectorResult`.
    pub async fn collect(&self) -> CollectorResult {
        let started = Instant::now();
        let timeout = self.descriptor.effective_timeout();

        let result = match self.execute().await {
            Ok(data) => CollectorResult::success(data, started.elapsed()),
            Err(err) => {
                if matches!(err, CollectorError::Timeout { .. }) {
                    METRICS.collectors_timed_out.fetch_add(1, Ordering::Relaxed);
                }
                CollectorResult::failure(&err, started.elapsed())
            }
        };

        result
            .with_metadata("priority", self.descriptor.priority.value())
            .with_metadata("timeoutMs", timeout.as_millis() as u64)
    }

    async fn execute(&self) -> Result<TelemetryRecord, CollectorError> {
        if !self.is_supported() {
            return Err(CollectorError::Unsupported {
                id: self.descriptor.id.clone(),
            });
        }

        let raw = self.race_timeout().await?;
        self.apply_hooks(raw)
    }

    /// Races the probe against its timeout.
    ///
    /// The probe runs as its own task and is never aborted. When the
    /// timer wins, the shared `settled` flag tells the probe task that
    /// its eventual output is stale; the task drops it instead of
    /// handing it back.
    async fn race_timeout(&self) -> Result<TelemetryRecord, CollectorError> {
        let timeout = self.descriptor.effective_timeout();
        let settled = Arc::new(AtomicBool::new(false));

        let mut task = tokio::spawn({
            let probe = self.probe.clone();
            let settled = settled.clone();
            let id = self.descriptor.id.clone();

            async move {
                let outcome = probe.probe().await;

                if settled.swap(true, Ordering::AcqRel) {
                    METRICS.late_results_discarded.fetch_add(1, Ordering::Relaxed);
                    debug!("collector {id} settled after its timeout, result discarded");
                    return None;
                }

                Some(outcome)
            }
        });

        // Whoever flips `settled` first decides the outcome. A probe that
        // is ready wins over a timer that fired in the same tick.
        tokio::select! {
            biased;

            joined = &mut task => settle(joined, timeout),

            _ = sleep(timeout) => {
                if settled.swap(true, Ordering::AcqRel) {
                    // Probe settled first, its output is already on the way
                    return settle(task.await, timeout);
                }
                Err(CollectorError::Timeout { ms: timeout.as_millis() })
            }
        }
    }

    fn apply_hooks(&self, raw: TelemetryRecord) -> Result<TelemetryRecord, CollectorError> {
        let transform = &self.hooks.transform;
        let transformed = panic::catch_unwind(AssertUnwindSafe(|| transform(raw)))
            .map_err(|payload| CollectorError::Probe(panic_message(payload.as_ref())))?
            .map_err(|err| CollectorError::Probe(err.to_string()))?;

        let validate = &self.hooks.validate;
        let accepted = panic::catch_unwind(AssertUnwindSafe(|| validate(&transformed)))
            .map_err(|payload| CollectorError::Probe(panic_message(payload.as_ref())))?;

        if !accepted {
            return Err(CollectorError::Validation {
                id: self.descriptor.id.clone(),
            });
        }

        Ok(transformed)
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

type ProbeOutcome = Option<anyhow::Result<TelemetryRecord>>;

fn settle(
    joined: Result<ProbeOutcome, JoinError>,
    timeout: Duration,
) -> Result<TelemetryRecord, CollectorError> {
    match joined {
        Ok(Some(Ok(data))) => Ok(data),
        Ok(Some(Err(err))) => Err(CollectorError::Probe(err.to_string())),
        Ok(None) => Err(CollectorError::Timeout { ms: timeout.as_millis() }),
        Err(join_err) => Err(CollectorError::Probe(join_error_message(join_err))),
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic().as_ref())
    } else {
        "collector task was cancelled".to_string()
    }
}
