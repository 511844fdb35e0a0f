// stakeledger/node/src/config.rs

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stakeledger_economics::{ValuationConfig, DEFAULT_TOTAL_SUPPLY};
use stakeledger_fees::ProcessorConfig;
use std::path::{Path, PathBuf};

/// Node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Supply ledger seed values
    #[serde(default)]
    pub supply: SupplyConfig,

    /// Price derivation
    #[serde(default)]
    pub valuation: ValuationConfig,

    /// Fee processor tuning
    #[serde(default)]
    pub fees: ProcessorConfig,

    /// Periodic batch trigger
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; state is lost on exit
    Memory,
    /// RocksDB under `data_dir`
    Rocksdb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Data directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_backend() -> StorageBackend {
    StorageBackend::Rocksdb
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stakeledger")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyConfig {
    /// Total supply written to a fresh ledger. Ignored once the ledger exists.
    pub total_supply: Decimal,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            total_supply: Decimal::from(DEFAULT_TOTAL_SUPPLY),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between batch runs
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Run a batch immediately instead of waiting one interval
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

fn default_interval() -> u64 {
    3600 // 1 hour
}

fn default_run_on_start() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            run_on_start: default_run_on_start(),
        }
    }
}

impl NodeConfig {
    /// Load from a TOML file (or defaults), then apply environment overrides.
    ///
    /// Environment variables:
    /// - STAKELEDGER_DATA_DIR: data directory
    /// - STAKELEDGER_STORAGE: `memory` or `rocksdb`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {:?}", path))?;
                Self::from_toml(&raw).with_context(|| format!("Invalid config {:?}", path))?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("STAKELEDGER_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Ok(backend) = std::env::var("STAKELEDGER_STORAGE") {
            match backend.to_lowercase().as_str() {
                "memory" => self.storage.backend = StorageBackend::Memory,
                "rocksdb" => self.storage.backend = StorageBackend::Rocksdb,
                other => tracing::warn!("Ignoring unknown STAKELEDGER_STORAGE={}", other),
            }
        }
    }

    /// Reject settings that would make the node misbehave at runtime
    pub fn validate(&self) -> Result<()> {
        self.fees
            .validate()
            .map_err(|e| anyhow::anyhow!("[fees] {}", e))?;
        self.valuation
            .validate()
            .map_err(|e| anyhow::anyhow!("[valuation] {}", e))?;

        if self.scheduler.interval_secs == 0 {
            bail!("[scheduler] interval_secs must be positive");
        }
        if self.supply.total_supply < Decimal::ZERO {
            bail!("[supply] total_supply must not be negative");
        }
        Ok(())
    }
}
