//! Built-in signal probes and the default collector set
//!
//! This module provides:
//! - One probe per host signal, each in its own module
//! - The canonical default set installed by `TelemetryService::new`
//!
//! Probe-specific logic lives in the probe modules. The rest of the
//! crate only sees them through the `SignalProbe` trait.

mod automation;
mod locale;
mod platform;
mod user_agent;

pub use automation::AutomationProbe;
pub use locale::LocaleProbe;
pub use platform::PlatformProbe;
pub use user_agent::UserAgentProbe;

use crate::collector::Collector;

/// Returns a fresh instance of every built-in collector.
///
/// CONTRACT:
/// - Ids are unique across the set
/// - Field sets are disjoint, so merge order never matters for them
///
pub fn default_collectors() -> Vec<Collector> {
    vec![
        Collector::new(UserAgentProbe),
        Collector::new(PlatformProbe),
        Collector::new(LocaleProbe::from_env()),
        Collector::new(AutomationProbe::from_env()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_ids_are_unique() {
        let collectors = default_collectors();
        let ids: HashSet<_> = collectors.iter().map(|c| c.id().to_string()).collect();

        assert_eq!(ids.len(), collectors.len());
    }

    #[tokio::test]
    async fn default_field_sets_are_disjoint() {
        let mut seen = HashSet::new();

        for collector in default_collectors() {
            let result = collector.collect().await;
            let Some(data) = result.data else { continue };

            for field in data.populated_fields() {
                assert!(seen.insert(field), "{field} written by more than one collector");
            }
        }
    }
}
