// stakeledger/core/economics/src/supply.rs

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User-facing supply issued at launch
pub const DEFAULT_TOTAL_SUPPLY: u64 = 1_000_000;

/// Issued vs. consumed supply of the token
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupplyLedger {
    pub total_supply: Decimal,
    pub consumed_supply: Decimal,
}

impl Default for SupplyLedger {
    fn default() -> Self {
        Self::new(Decimal::from(DEFAULT_TOTAL_SUPPLY))
    }
}

impl SupplyLedger {
    /// Create a ledger with nothing consumed yet
    pub fn new(total_supply: Decimal) -> Self {
        Self {
            total_supply,
            consumed_supply: Decimal::ZERO,
        }
    }

    pub fn with_consumed(total_supply: Decimal, consumed_supply: Decimal) -> Self {
        Self {
            total_supply,
            consumed_supply,
        }
    }

    /// Supply still available for issuance. Zero once fully consumed.
    pub fn remaining_supply(&self) -> Decimal {
        if self.consumed_supply >= self.total_supply {
            Decimal::ZERO
        } else {
            self.total_supply - self.consumed_supply
        }
    }

    /// Consumed fraction of the supply clamped to [0, 1].
    ///
    /// Returns `None` when the total supply is zero or negative, since no
    /// meaningful ratio exists.
    pub fn usage(&self) -> Option<Decimal> {
        if self.total_supply <= Decimal::ZERO {
            return None;
        }
        let ratio = self.consumed_supply.checked_div(self.total_supply)?;
        Some(ratio.max(Decimal::ZERO).min(Decimal::ONE))
    }

    /// Consume supply for a token issuance
    pub fn issue(&mut self, amount: Decimal) -> Result<(), SupplyError> {
        if amount <= Decimal::ZERO {
            return Err(SupplyError::InvalidAmount(amount));
        }

        let new_consumed = self
            .consumed_supply
            .checked_add(amount)
            .ok_or(SupplyError::InvalidAmount(amount))?;

        if new_consumed > self.total_supply {
            return Err(SupplyError::ExceedsSupply {
                requested: amount,
                remaining: self.remaining_supply(),
            });
        }

        self.consumed_supply = new_consumed;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SupplyError {
    #[error("Issuance of {requested} would exceed remaining supply {remaining}")]
    ExceedsSupply { requested: Decimal, remaining: Decimal },

    #[error("Invalid issuance amount: {0}")]
    InvalidAmount(Decimal),
}

/// Anything that can hand out a consistent snapshot of the supply ledger
#[async_trait]
pub trait SupplySource: Send + Sync {
    async fn supply_snapshot(&self) -> anyhow::Result<SupplyLedger>;
}

/// Supply ledger held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySupply {
    ledger: Arc<RwLock<SupplyLedger>>,
}

impl InMemorySupply {
    pub fn new(ledger: SupplyLedger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn issue(&self, amount: Decimal) -> Result<SupplyLedger, SupplyError> {
        let mut ledger = self.ledger.write();
        ledger.issue(amount)?;
        Ok(*ledger)
    }

    pub fn snapshot(&self) -> SupplyLedger {
        *self.ledger.read()
    }
}

#[async_trait]
impl SupplySource for InMemorySupply {
    async fn supply_snapshot(&self) -> anyhow::Result<SupplyLedger> {
        Ok(self.snapshot())
    }
}
