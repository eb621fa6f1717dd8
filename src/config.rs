//! Configuration for the ledger

use rust_decimal::Decimal;
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

    /// Ledger defaults (resolved once at call entry, never read from
    /// process-wide constants)
    pub defaults: LedgerDefaults,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/coin-ledger"),
            service_name: "coin-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            defaults: LedgerDefaults::default(),
            rocksdb: RocksDbConfig::default(),
        }
    }
}

/// Ledger defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerDefaults {
    /// Customer namespace used when a call does not name one
    pub customer: String,

    /// Treasure ID used when a call does not name one
    pub treasure_id: String,

    /// Initial treasure balance at bootstrap
    pub treasure_balance: Decimal,

    /// Registration amount written to the default options record at bootstrap
    pub registration_amount: Decimal,
}

impl Default for LedgerDefaults {
    fn default() -> Self {
        Self {
            customer: "default".to_string(),
            treasure_id: "treasure".to_string(),
            treasure_balance: Decimal::from(210_000_000u64),
            registration_amount: Decimal::from(110u64),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            target_file_size_mb: 64,
            max_background_jobs: 2,
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

        if let Ok(data_dir) = std::env::var("LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(customer) = std::env::var("LEDGER_DEFAULT_CUSTOMER") {
            config.defaults.customer = customer;
        }

        if let Ok(treasure_id) = std::env::var("LEDGER_TREASURE_ID") {
            config.defaults.treasure_id = treasure_id;
        }

        if let Ok(balance) = std::env::var("LEDGER_TREASURE_BALANCE") {
            config.defaults.treasure_balance = balance.parse().map_err(|_| {
                crate::Error::Config(format!("Invalid LEDGER_TREASURE_BALANCE: {}", balance))
            })?;
        }

        if let Ok(amount) = std::env::var("LEDGER_REGISTRATION_AMOUNT") {
            config.defaults.registration_amount = amount.parse().map_err(|_| {
                crate::Error::Config(format!("Invalid LEDGER_REGISTRATION_AMOUNT: {}", amount))
            })?;
        }

        Ok(config)
    }
}
