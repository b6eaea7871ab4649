use serde::Deserialize;

use crate::fingerprint::HashAlgorithm;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Top-level configuration loaded from `config.json`.
//
// It defines:
// - Whether per-collector progress is logged
// - The default device id length for a collection pass
// - The digest used to reduce a record to its fingerprint
// - Optional debug settings for the binary's logger
//
// The service reads this once at construction and never
// re-reads it while a pass is in flight.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Emits one log line per collector (start, success, failure)
    pub enable_logging: bool,

    /// Number of hex characters in the generated device id
    pub device_id_length: usize,

    /// Digest used by the fingerprint reducer
    pub hash_algorithm: HashAlgorithm,

    /// Optional debug configuration
    pub debug: Option<DebugConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_logging: false,
            device_id_length: 32,
            hash_algorithm: HashAlgorithm::Sha256,
            debug: None,
        }
    }
}

impl Config {
    /// Logger filter requested by the debug section, if any.
    pub fn log_level(&self) -> Option<&str> {
        self.debug.as_ref().and_then(|d| d.log_level.as_deref())
    }
}

// ------------------------------------------------------------
// Debug configuration
// ------------------------------------------------------------
//
// Optional flags used during development and testing.
//
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DebugConfig {
    /// env_logger filter string (e.g. "debug", "env_signal_collector=trace")
    pub log_level: Option<String>,
}
