use std::env;
use std::time::Duration;

use crate::{
    collector::{CollectorCategory, CollectorDescriptor, CollectorPriority, ProbeHooks, SignalProbe},
    schema::{AutomationInfo, TelemetryRecord},
};

/// Environment variables left behind by browser automation drivers.
const AUTOMATION_MARKERS: [&str; 6] = [
    "WEBDRIVER",
    "SELENIUM_REMOTE_URL",
    "CHROMEDRIVER_PATH",
    "GECKODRIVER_PATH",
    "PUPPETEER_EXECUTABLE_PATH",
    "PLAYWRIGHT_BROWSERS_PATH",
];

/// Flags automation tooling visible to this process.
///
/// Fields: `automationInfo` (one check per marker, in marker order).
pub struct AutomationProbe {
    present: Vec<bool>,
}

impl AutomationProbe {
    pub fn from_env() -> Self {
        Self::with_lookup(|name| env::var_os(name).is_some())
    }

    pub fn with_lookup(lookup: impl Fn(&str) -> bool) -> Self {
        Self {
            present: AUTOMATION_MARKERS.iter().map(|m| lookup(m)).collect(),
        }
    }
}

#[async_trait::async_trait]
impl SignalProbe for AutomationProbe {
    fn descriptor(&self) -> CollectorDescriptor {
        CollectorDescriptor::new(
            "automation-detection",
            CollectorCategory::Security,
            CollectorPriority::High,
        )
        .with_timeout(Duration::from_millis(2000))
    }

    async fn probe(&self) -> anyhow::Result<TelemetryRecord> {
        Ok(TelemetryRecord {
            automation_info: Some(AutomationInfo {
                automation_tool_detected: Some(self.present.iter().any(|&hit| hit)),
                webdriver_checks: self.present.clone(),
            }),
            ..Default::default()
        })
    }

    fn hooks(&self) -> ProbeHooks {
        ProbeHooks::default().with_validator(|data| {
            data.automation_info
                .as_ref()
                .is_some_and(|info| info.automation_tool_detected.is_some())
        })
    }
}
