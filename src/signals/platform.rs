use std::env::consts::{ARCH, OS};
use std::thread;

use crate::{
    collector::{CollectorCategory, CollectorDescriptor, CollectorPriority, SignalProbe},
    schema::{NavigatorInfo, TelemetryRecord},
};

/// Host hardware and OS facts.
///
/// Fields: `navigatorInfo`.
pub struct PlatformProbe;

#[async_trait::async_trait]
impl SignalProbe for PlatformProbe {
    fn descriptor(&self) -> CollectorDescriptor {
        CollectorDescriptor::new(
            "platform-info",
            CollectorCategory::System,
            CollectorPriority::Critical,
        )
    }

    async fn probe(&self) -> anyhow::Result<TelemetryRecord> {
        // available_parallelism fails inside some sandboxes; treat as unknown
        let hardware_concurrency = thread::available_parallelism()
            .ok()
            .map(|n| n.get() as i64);

        Ok(TelemetryRecord {
            navigator_info: Some(NavigatorInfo {
                platform: Some(OS.to_string()),
                cpu_class: Some(ARCH.to_string()),
                hardware_concurrency,
                max_touch_points: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}
