// stakeledger/core/fees/src/config.rs

use crate::error::FeeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fee processor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Wallets charged in parallel during a batch
    pub max_concurrency: usize,

    /// Upper bound on any single storage call (milliseconds)
    pub storage_timeout_ms: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            storage_timeout_ms: 5_000,
        }
    }
}

impl ProcessorConfig {
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), FeeError> {
        if self.max_concurrency == 0 {
            return Err(FeeError::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.storage_timeout_ms == 0 {
            return Err(FeeError::Configuration(
                "storage_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
