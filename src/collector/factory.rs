//! Construction helpers for collectors that don't warrant their own type.
//!
//! - `simple`: closure-backed collector, MEDIUM priority and 5s timeout
//!   unless told otherwise
//! - `custom`: any `SignalProbe` under an explicit descriptor

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use super::{
    Collector, CollectorCategory, CollectorDescriptor, CollectorPriority, ProbeHooks,
    SignalProbe,
};
use crate::schema::TelemetryRecord;

const SIMPLE_DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

type DataCollector =
    Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<TelemetryRecord>> + Send + Sync>;
type SupportCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// Builder-style description of a closure-backed collector.
pub struct SimpleCollectorConfig {
    id: String,
    category: CollectorCategory,
    priority: Option<CollectorPriority>,
    timeout: Option<Duration>,
    support_check: Option<SupportCheck>,
    data_collector: DataCollector,
    hooks: ProbeHooks,
}

impl SimpleCollectorConfig {
    pub fn new<F, Fut>(
        id: impl Into<String>,
        category: CollectorCategory,
        data_collector: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<TelemetryRecord>> + Send + 'static,
    {
        Self {
            id: id.into(),
            category,
            priority: None,
            timeout: None,
            support_check: None,
            data_collector: Arc::new(move || data_collector().boxed()),
            hooks: ProbeHooks::default(),
        }
    }

    pub fn priority(mut self, priority: CollectorPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn support_check<F>(mut self, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.support_check = Some(Arc::new(check));
        self
    }

    pub fn validator<F>(mut self, validate: F) -> Self
    where
        F: Fn(&TelemetryRecord) -> bool + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_validator(validate);
        self
    }

    pub fn transformer<F>(mut self, transform: F) -> Self
    where
        F: Fn(TelemetryRecord) -> anyhow::Result<TelemetryRecord> + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_transformer(transform);
        self
    }
}

struct SimpleProbe {
    descriptor: CollectorDescriptor,
    support_check: Option<SupportCheck>,
    data_collector: DataCollector,
    hooks: ProbeHooks,
}

#[async_trait::async_trait]
impl SignalProbe for SimpleProbe {
    fn descriptor(&self) -> CollectorDescriptor {
        self.descriptor.clone()
    }

    fn is_supported(&self) -> bool {
        self.support_check.as_ref().is_none_or(|check| check())
    }

    async fn probe(&self) -> anyhow::Result<TelemetryRecord> {
        (self.data_collector)().await
    }

    fn hooks(&self) -> ProbeHooks {
        self.hooks.clone()
    }
}

/// Builds a collector from closures.
pub fn simple(config: SimpleCollectorConfig) -> Collector {
    let descriptor = CollectorDescriptor::new(
        config.id,
        config.category,
        config.priority.unwrap_or(CollectorPriority::Medium),
    )
    .with_timeout(config.timeout.unwrap_or(SIMPLE_DEFAULT_TIMEOUT));

    Collector::new(SimpleProbe {
        descriptor,
        support_check: config.support_check,
        data_collector: config.data_collector,
        hooks: config.hooks,
    })
}

/// Wraps an arbitrary probe under `descriptor`, ignoring the one the
/// probe reports about itself.
pub fn custom(descriptor: CollectorDescriptor, probe: impl SignalProbe + 'static) -> Collector {
    Collector::with_descriptor(descriptor, probe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_defaults_to_medium_and_five_seconds() {
        let collector = simple(SimpleCollectorConfig::new(
            "fonts",
            CollectorCategory::Fingerprinting,
            || async { Ok(TelemetryRecord::default()) },
        ));

        let descriptor = collector.descriptor();
        assert_eq!(descriptor.priority, CollectorPriority::Medium);
        assert_eq!(descriptor.timeout, Some(Duration::from_millis(5000)));
        assert!(collector.is_supported());
    }

    #[tokio::test]
    async fn simple_runs_closures() {
        let collector = simple(
            SimpleCollectorConfig::new("codecs", CollectorCategory::Media, || async {
                Ok(TelemetryRecord {
                    supported_video_audio_codecs: Some(vec!["vp9".into(), "av1".into()]),
                    ..Default::default()
                })
            })
            .priority(CollectorPriority::Optional)
            .timeout(Duration::from_millis(200))
            .transformer(|mut record| {
                if let Some(codecs) = record.supported_video_audio_codecs.as_mut() {
                    codecs.sort();
                }
                Ok(record)
            })
            .validator(|record| record.supported_video_audio_codecs.is_some()),
        );

        let result = collector.collect().await;

        assert!(result.success);
        assert_eq!(
            result.data.unwrap().supported_video_audio_codecs,
            Some(vec!["av1".to_string(), "vp9".to_string()])
        );
    }

    #[test]
    fn custom_uses_the_given_descriptor() {
        struct Probe;

        #[async_trait::async_trait]
        impl SignalProbe for Probe {
            fn descriptor(&self) -> CollectorDescriptor {
                CollectorDescriptor::new(
                    "inner",
                    CollectorCategory::Network,
                    CollectorPriority::Low,
                )
            }

            async fn probe(&self) -> anyhow::Result<TelemetryRecord> {
                Ok(TelemetryRecord::default())
            }
        }

        let descriptor = CollectorDescriptor::new(
            "outer",
            CollectorCategory::Performance,
            CollectorPriority::High,
        )
        .with_dependencies(["screen-info"]);
        let collector = custom(descriptor, Probe);

        assert_eq!(collector.id(), "outer");
        assert_eq!(collector.category(), CollectorCategory::Performance);
        assert_eq!(collector.descriptor().dependencies, vec!["screen-info".to_string()]);
    }
}
