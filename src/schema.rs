use serde::{Deserialize, Serialize};

/// Declares `TelemetryRecord` together with its field-wise merge.
///
/// Every field is optional. A collector returns a `TelemetryRecord`
/// with only its own fields populated, and the service folds those
/// fragments into one composite record.
macro_rules! telemetry_record {
    ($( $(#[$meta:meta])* $field:ident : $ty:ty ),* $(,)?) => {
        /// Composite record built during one collection pass.
        ///
        /// Also used as the partial fragment a single collector returns.
        /// Serialized in camelCase to stay compatible with downstream
        /// consumers of the payload.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct TelemetryRecord {
            $(
                $(#[$meta])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl TelemetryRecord {
            /// Applies every present field of `fragment` onto `self`.
            ///
            /// Last writer wins. Returns the names of the fields written,
            /// in declaration order.
            pub fn merge(&mut self, fragment: TelemetryRecord) -> Vec<&'static str> {
                let mut written = Vec::new();
                $(
                    if let Some(value) = fragment.$field {
                        self.$field = Some(value);
                        written.push(stringify!($field));
                    }
                )*
                written
            }

            /// Names of the fields currently set.
            pub fn populated_fields(&self) -> Vec<&'static str> {
                let mut fields = Vec::new();
                $(
                    if self.$field.is_some() {
                        fields.push(stringify!($field));
                    }
                )*
                fields
            }
        }
    };
}

telemetry_record! {
    user_agent: String,
    language: String,
    platform: String,
    /// Minutes to add to local time to reach UTC
    timezone_offset_minutes: i32,
    screen_info: ScreenInfo,
    webgl_info: WebGlInfo,
    browser_capability_info: BrowserCapabilityInfo,
    navigator_info: NavigatorInfo,
    automation_info: AutomationInfo,
    audio_fingerprint: String,
    rects_fingerprint: f64,
    fullscreen_api_fingerprint: i64,
    math_fingerprint: f64,
    eval_length_fingerprint: i64,
    mobile_heuristics: MobileHeuristics,
    stored_website_data: Vec<String>,
    indexed_db_keys: Vec<String>,
    max_touch_points: i64,
    touch_capability_details: TouchCapabilityDetails,
    media_query_matches: Vec<String>,
    supported_video_audio_codecs: Vec<String>,
    permission_statuses: Vec<PermissionStatus>,
    time_format_preference: i64,
    to_fixed_engine_id: i64,
    installed_fonts: Vec<String>,
    endianness_byte: i64,
    incognito_detected: bool,
    /// Random per-pass identifier, excluded from the fingerprint
    device_id: String,
    /// Set once the record has been reduced
    fingerprint: String,
}

// ------------------------------------------------------------
// Nested signal groups
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenInfo {
    pub dimensions: Option<Dimensions>,
    pub avail_dimensions: Option<Dimensions>,
    pub color_depth: Option<i64>,
    pub device_pixel_ratio: Option<f64>,
    pub screen_dpi: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebGlInfo {
    pub max_viewport_dims: Option<Dimensions>,
    pub max_texture_size: Option<i64>,
    pub max_texture_image_units: Option<i64>,
    pub max_fragment_uniform_vectors: Option<i64>,
    pub max_varying_vectors: Option<i64>,
    pub unmasked_renderer: Option<String>,
    pub vendor: Option<String>,
    pub renderer: Option<String>,
    pub webgl2_supported: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserCapabilityInfo {
    pub has_session_storage: Option<i64>,
    pub has_local_storage: Option<i64>,
    #[serde(rename = "hasIndexedDB")]
    pub has_indexed_db: Option<i64>,
    pub cookies_enabled: Option<bool>,
    pub java_enabled: Option<bool>,
    pub has_webkit_request_file_system: Option<bool>,
    pub has_open_database: Option<bool>,
    pub has_promise_all_settled: Option<bool>,
    pub has_ms_save_blob: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorInfo {
    pub user_agent: Option<String>,
    pub platform: Option<String>,
    pub language: Option<String>,
    pub languages: Option<Vec<String>>,
    pub hardware_concurrency: Option<i64>,
    pub max_touch_points: Option<i64>,
    pub cpu_class: Option<String>,
    pub has_service_worker: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationInfo {
    pub automation_tool_detected: Option<bool>,
    pub webdriver_checks: Vec<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileHeuristics {
    pub by_touch_event: Option<bool>,
    pub device_orientation_api_detected: Option<bool>,
    pub specific_user_agent_pattern_detected: Option<bool>,
    pub is_mobile: Option<bool>,
    pub is_tablet: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchCapabilityDetails {
    pub max_points: Option<i64>,
    pub touch_api_supported: Option<bool>,
    pub touch_event_supported: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionStatus {
    pub name: String,
    pub state: String,
}
