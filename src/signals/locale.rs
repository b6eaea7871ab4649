use std::env;

use chrono::{Local, Offset};

use crate::{
    collector::{CollectorCategory, CollectorDescriptor, CollectorPriority, ProbeHooks, SignalProbe},
    schema::TelemetryRecord,
};

/// Locale variables in lookup order, first non-empty one wins.
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Preferred language and timezone offset.
///
/// Fields: `language`, `timezoneOffsetMinutes`.
pub struct LocaleProbe {
    raw_locale: Option<String>,
}

impl LocaleProbe {
    pub fn from_env() -> Self {
        let raw_locale = LOCALE_VARS
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.is_empty());
        Self { raw_locale }
    }

    pub fn with_locale(raw: impl Into<String>) -> Self {
        Self {
            raw_locale: Some(raw.into()),
        }
    }
}

#[async_trait::async_trait]
impl SignalProbe for LocaleProbe {
    fn descriptor(&self) -> CollectorDescriptor {
        CollectorDescriptor::new("locale", CollectorCategory::Browser, CollectorPriority::High)
    }

    async fn probe(&self) -> anyhow::Result<TelemetryRecord> {
        let offset_secs = Local::now().offset().fix().local_minus_utc();

        Ok(TelemetryRecord {
            language: self.raw_locale.as_deref().and_then(normalize_locale),
            // Minutes to add to local time to get UTC, east of UTC is negative
            timezone_offset_minutes: Some(-offset_secs / 60),
            ..Default::default()
        })
    }

    fn hooks(&self) -> ProbeHooks {
        ProbeHooks::default().with_validator(|data| data.timezone_offset_minutes.is_some())
    }
}

/// "en_US.UTF-8" -> "en-US", "de_DE@euro" -> "de-DE".
/// "C" and "POSIX" carry no language and map to `None`.
fn normalize_locale(raw: &str) -> Option<String> {
    let tag = raw.split(['.', '@']).next()?.trim();
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    Some(tag.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_posix_locales() {
        assert_eq!(normalize_locale("en_US.UTF-8").as_deref(), Some("en-US"));
        assert_eq!(normalize_locale("de_DE@euro").as_deref(), Some("de-DE"));
        assert_eq!(normalize_locale("fr").as_deref(), Some("fr"));
        assert_eq!(normalize_locale("C.UTF-8"), None);
        assert_eq!(normalize_locale("POSIX"), None);
        assert_eq!(normalize_locale(""), None);
    }

    #[tokio::test]
    async fn reports_language_and_offset() {
        let data = LocaleProbe::with_locale("pt_BR.UTF-8").probe().await.unwrap();

        assert_eq!(data.language.as_deref(), Some("pt-BR"));
        let offset = data.timezone_offset_minutes.unwrap();
        assert!((-14 * 60..=12 * 60).contains(&offset));
    }
}
