use std::env::consts::{ARCH, OS};
use std::time::Duration;

use crate::{
    collector::{CollectorCategory, CollectorDescriptor, CollectorPriority, ProbeHooks, SignalProbe},
    schema::TelemetryRecord,
};

/// Identifies the running client and the platform it was built for.
///
/// Fields: `userAgent`, `platform`.
pub struct UserAgentProbe;

#[async_trait::async_trait]
impl SignalProbe for UserAgentProbe {
    fn descriptor(&self) -> CollectorDescriptor {
        CollectorDescriptor::new(
            "user-agent",
            CollectorCategory::Device,
            CollectorPriority::Critical,
        )
        .with_timeout(Duration::from_millis(1000))
    }

    async fn probe(&self) -> anyhow::Result<TelemetryRecord> {
        Ok(TelemetryRecord {
            user_agent: Some(format!(
                "{}/{} ({OS}; {ARCH})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
            )),
            platform: Some(platform_label()),
            ..Default::default()
        })
    }

    fn hooks(&self) -> ProbeHooks {
        ProbeHooks::default().with_validator(|data| {
            data.user_agent.as_deref().is_some_and(|ua| !ua.is_empty())
        })
    }
}

/// "Linux x86_64", "Macos aarch64", ...
fn platform_label() -> String {
    let mut os = OS.chars();
    let os = match os.next() {
        Some(first) => first.to_uppercase().chain(os).collect::<String>(),
        None => "unknown".to_string(),
    };
    format!("{os} {ARCH}")
}
