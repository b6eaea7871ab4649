//! Reduction of a `TelemetryRecord` to one stable fingerprint.
//!
//! Only an explicitly enumerated, ordered subset of the record takes
//! part. Adding a field to the schema never changes existing
//! fingerprints; adding it here does, so this list only grows on purpose.
//!
//! Canonical form:
//! - scalars render with `Display`, absent values render as ""
//! - string collections are sorted and joined with `,`
//! - every piece is joined with `|` in enumeration order
//!
//! Nested groups (capabilities, webgl, ...) contribute their fields only
//! when the group itself is present.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::schema::TelemetryRecord;

const FIELD_DELIMITER: &str = "|";
const LIST_DELIMITER: &str = ",";

/// Digest used for the final hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256, 64 lowercase hex characters
    #[default]
    Sha256,

    /// Order-sensitive `h * 31 + unit` over UTF-16 code units in
    /// wrapping 32-bit arithmetic, 8 lowercase hex characters.
    /// Stable but not collision resistant.
    Rolling,
}

/// Lowercase hex digest of a record's canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduces `record` with the given digest. Pure: same record, same output.
pub fn compute(record: &TelemetryRecord, algorithm: HashAlgorithm) -> Fingerprint {
    let canonical = canonical_string(record);
    let hex = match algorithm {
        HashAlgorithm::Sha256 => sha256_hex(&canonical),
        HashAlgorithm::Rolling => rolling_hash_hex(&canonical),
    };
    Fingerprint(hex)
}

pub fn sha256_hex(message: &str) -> String {
    hex::encode(Sha256::digest(message.as_bytes()))
}

pub fn rolling_hash_hex(message: &str) -> String {
    let hash = message
        .encode_utf16()
        .fold(0_i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32));
    format!("{:08x}", hash as u32)
}

/// Builds the `|`-joined canonical form hashed by `compute`.
pub fn canonical_string(record: &TelemetryRecord) -> String {
    let mut fields = CanonicalFields::default();

    if let Some(caps) = &record.browser_capability_info {
        fields.scalar(&caps.cookies_enabled);
        fields.scalar(&caps.has_indexed_db);
        fields.scalar(&caps.has_local_storage);
        fields.scalar(&caps.has_ms_save_blob);
        fields.scalar(&caps.has_open_database);
        fields.scalar(&caps.has_promise_all_settled);
        fields.scalar(&caps.has_session_storage);
        fields.scalar(&caps.has_webkit_request_file_system);
        fields.scalar(&caps.java_enabled);
    }

    fields.scalar(&record.endianness_byte);
    fields.scalar(&record.eval_length_fingerprint);
    fields.scalar(&record.fullscreen_api_fingerprint);
    fields.scalar(&record.math_fingerprint);
    fields.scalar(&record.max_touch_points);

    if let Some(matches) = &record.media_query_matches {
        fields.set(matches.iter().cloned());
    }

    if let Some(mobile) = &record.mobile_heuristics {
        fields.scalar(&mobile.by_touch_event);
        fields.scalar(&mobile.device_orientation_api_detected);
        fields.scalar(&mobile.specific_user_agent_pattern_detected);
    }

    if let Some(nav) = &record.navigator_info {
        fields.scalar(&nav.cpu_class);
        fields.scalar(&nav.has_service_worker);
    }

    if let Some(permissions) = &record.permission_statuses {
        fields.set(permissions.iter().map(|p| format!("{}:{}", p.name, p.state)));
    }

    fields.scalar(&record.platform);
    fields.scalar(&record.rects_fingerprint);

    if let Some(codecs) = &record.supported_video_audio_codecs {
        fields.set(codecs.iter().cloned());
    }

    fields.scalar(&record.time_format_preference);
    fields.scalar(&record.timezone_offset_minutes);
    fields.scalar(&record.to_fixed_engine_id);

    if let Some(touch) = &record.touch_capability_details {
        fields.scalar(&touch.max_points);
        fields.scalar(&touch.touch_api_supported);
        fields.scalar(&touch.touch_event_supported);
    }

    if let Some(webgl) = &record.webgl_info {
        fields.scalar(&webgl.max_fragment_uniform_vectors);
        fields.scalar(&webgl.max_texture_image_units);
        fields.scalar(&webgl.max_texture_size);
        fields.scalar(&webgl.max_varying_vectors);
        if let Some(dims) = &webgl.max_viewport_dims {
            fields.scalar(&Some(dims.width));
            fields.scalar(&Some(dims.height));
        }
        fields.scalar(&webgl.unmasked_renderer);
        fields.scalar(&webgl.webgl2_supported);
    }

    fields.0.join(FIELD_DELIMITER)
}

#[derive(Default)]
struct CanonicalFields(Vec<String>);

impl CanonicalFields {
    fn scalar<T: Display>(&mut self, value: &Option<T>) {
        self.0.push(value.as_ref().map(ToString::to_string).unwrap_or_default());
    }

    /// Discovery order must not matter, so collections are sorted first.
    fn set(&mut self, values: impl Iterator<Item = String>) {
        let mut values: Vec<String> = values.collect();
        values.sort();
        self.0.push(values.join(LIST_DELIMITER));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BrowserCapabilityInfo, Dimensions, PermissionStatus, WebGlInfo};

    fn sample() -> TelemetryRecord {
        TelemetryRecord {
            platform: Some("Linux x86_64".into()),
            timezone_offset_minutes: Some(-120),
            endianness_byte: Some(255),
            media_query_matches: Some(vec![
                "prefers-color-scheme: dark".into(),
                "any-hover: hover".into(),
            ]),
            supported_video_audio_codecs: Some(vec!["vp9".into(), "av1".into(), "h264".into()]),
            permission_statuses: Some(vec![
                PermissionStatus { name: "notifications".into(), state: "denied".into() },
                PermissionStatus { name: "camera".into(), state: "prompt".into() },
            ]),
            webgl_info: Some(WebGlInfo {
                max_texture_size: Some(16384),
                max_viewport_dims: Some(Dimensions { width: 32767, height: 32767 }),
                unmasked_renderer: Some("Mesa Intel(R) Xe Graphics".into()),
                webgl2_supported: Some(true),
                ..Default::default()
            }),
            user_agent: Some("excluded".into()),
            device_id: Some("also-excluded".into()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_record_renders_placeholders_for_top_level_scalars() {
        // endianness, eval, fullscreen, math, touch points, platform,
        // rects, time format, timezone, to_fixed
        assert_eq!(canonical_string(&TelemetryRecord::default()), "|".repeat(9));
    }

    #[test]
    fn canonical_form_follows_enumeration_order() {
        let record = TelemetryRecord {
            browser_capability_info: Some(BrowserCapabilityInfo {
                cookies_enabled: Some(true),
                has_indexed_db: Some(1),
                ..Default::default()
            }),
            endianness_byte: Some(255),
            platform: Some("MacIntel".into()),
            ..Default::default()
        };

        assert_eq!(canonical_string(&record), "true|1||||||||255|||||MacIntel||||");
    }

    #[test]
    fn collections_are_sorted_before_joining() {
        let canonical = canonical_string(&sample());

        assert!(canonical.contains("|any-hover: hover,prefers-color-scheme: dark|"));
        assert!(canonical.contains("|camera:prompt,notifications:denied|"));
        assert!(canonical.contains("|av1,h264,vp9|"));
        assert!(canonical.ends_with("|16384||32767|32767|Mesa Intel(R) Xe Graphics|true"));
    }

    #[test]
    fn discovery_order_does_not_change_the_fingerprint() {
        let original = sample();
        let mut permuted = sample();
        permuted.media_query_matches.as_mut().unwrap().reverse();
        permuted.supported_video_audio_codecs.as_mut().unwrap().rotate_left(1);
        permuted.permission_statuses.as_mut().unwrap().reverse();

        for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Rolling] {
            assert_eq!(compute(&original, algorithm), compute(&permuted, algorithm));
        }
    }

    #[test]
    fn excluded_fields_do_not_participate() {
        let mut other = sample();
        other.user_agent = Some("different".into());
        other.device_id = Some("different".into());
        other.fingerprint = Some("stale".into());

        assert_eq!(
            compute(&sample(), HashAlgorithm::Sha256),
            compute(&other, HashAlgorithm::Sha256)
        );
    }

    #[test]
    fn included_fields_change_the_fingerprint() {
        let mut other = sample();
        other.platform = Some("Win32".into());

        assert_ne!(
            compute(&sample(), HashAlgorithm::Sha256),
            compute(&other, HashAlgorithm::Sha256)
        );
    }

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let fp = compute(&sample(), HashAlgorithm::Sha256);
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn rolling_hash_is_fixed_width_and_wraps() {
        assert_eq!(rolling_hash_hex(""), "00000000");
        // 'a' = 97 = 0x61
        assert_eq!(rolling_hash_hex("a"), "00000061");
        // 97 * 31 + 98 = 3105 = 0xc21
        assert_eq!(rolling_hash_hex("ab"), "00000c21");
        // "hello" hashes to 99162322 = 0x5e918d2
        assert_eq!(rolling_hash_hex("hello"), "05e918d2");
        assert_eq!(rolling_hash_hex(&"z".repeat(64)).len(), 8);
    }
}
