//! Configuration for the reservation ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Metrics listen address
    pub metrics_listen_addr: String,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Occupancy retention configuration
    pub retention: RetentionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/booking"),
            service_name: "booking-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            metrics_listen_addr: "0.0.0.0:9090".to_string(),
            rocksdb: RocksDBConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Level 0 file num compaction trigger
    pub level0_file_num_compaction_trigger: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            target_file_size_mb: 64,
            max_background_jobs: 4,
            level0_file_num_compaction_trigger: 4,
            enable_statistics: false,
        }
    }
}

/// Occupancy retention configuration
///
/// Occupancy rows for dates older than the horizon are irrelevant to any
/// future availability check and are purged by the retention sweeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Records with `date < today - horizon_days` are purged
    pub horizon_days: u32,

    /// Seconds between sweeps
    pub sweep_interval_secs: u64,

    /// Enable the background sweeper
    pub enabled: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            horizon_days: 31,
            sweep_interval_secs: 60 * 60 * 24, // daily
            enabled: true,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("BOOKING_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(addr) = std::env::var("BOOKING_METRICS_ADDR") {
            config.metrics_listen_addr = addr;
        }

        if let Ok(days) = std::env::var("BOOKING_RETENTION_DAYS") {
            config.retention.horizon_days = days
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid BOOKING_RETENTION_DAYS: {}", e)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "booking-core");
        assert_eq!(config.retention.horizon_days, 31);
        assert!(config.retention.enabled);
    }

    #[test]
    fn test_from_toml() {
        let toml_str = r#"
            data_dir = "/tmp/booking"
            service_name = "booking-core"
            service_version = "0.1.0"
            metrics_listen_addr = "127.0.0.1:9100"

            [rocksdb]
            write_buffer_size_mb = 32
            max_write_buffer_number = 2
            target_file_size_mb = 32
            max_background_jobs = 2
            level0_file_num_compaction_trigger = 4
            enable_statistics = false

            [retention]
            horizon_days = 14
            sweep_interval_secs = 3600
            enabled = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.retention.horizon_days, 14);
        assert!(!config.retention.enabled);
        assert_eq!(config.rocksdb.write_buffer_size_mb, 32);
    }
}
