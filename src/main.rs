// ------------------------------------------------------------
// External dependencies
// ------------------------------------------------------------

use env_signal_collector::{
    metrics::METRICS, CollectorRegistry, Config, TelemetryService,
};

use log::{info, warn};
use std::fs;
use std::path::Path;

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Runs one collection pass on this host and prints the record.
//
// Responsibilities:
// - Load configuration
// - Initialize logging
// - Build the service with the default collector set
// - Print the record (with fingerprint) and collector stats
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = load_config(&path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level().unwrap_or("info")),
    )
    .init();

    if !Path::new(&path).exists() {
        warn!("{path} not found, using default configuration");
    }

    let id_length = config.device_id_length;
    let service = TelemetryService::new(config, CollectorRegistry::new())?;

    let stats = service.get_collector_stats();
    info!(
        "{} collectors registered, {} supported",
        stats.total, stats.supported
    );

    let collection = service.collect(id_length).await;

    println!("{}", serde_json::to_string_pretty(&collection.record)?);
    println!("fingerprint: {}", collection.fingerprint);
    println!("stats: {}", serde_json::to_string(&stats)?);
    println!("{}", METRICS.summary());

    Ok(())
}

// ------------------------------------------------------------
// Configuration loader
// ------------------------------------------------------------
//
// Reads a JSON configuration file from disk and deserializes
// it into the strongly typed `Config` structure. A missing
// file means defaults.
//
fn load_config(path: &str) -> anyhow::Result<Config> {
    if !Path::new(path).exists() {
        return Ok(Config::default());
    }
    let data = fs::read_to_string(path)?;
    let cfg = serde_json::from_str(&data)?;
    Ok(cfg)
}
