// stakeledger/node/src/services.rs

use crate::config::{NodeConfig, StorageBackend};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use stakeledger_economics::{InMemorySupply, SupplyLedger, SupplySource, ValuationEngine};
use stakeledger_fees::FeeProcessor;
use stakeledger_primitives::Clock;
use stakeledger_storage::{
    InMemoryWalletStore, RocksDB, RocksSupplyStore, RocksWalletStore, WalletStore,
};
use std::sync::Arc;
use tracing::info;

/// Supply ledger behind whichever backend was configured
#[derive(Clone)]
pub enum SupplyHandle {
    Memory(Arc<InMemorySupply>),
    Rocks(Arc<RocksSupplyStore>),
}

impl SupplyHandle {
    pub fn source(&self) -> Arc<dyn SupplySource> {
        match self {
            SupplyHandle::Memory(supply) => supply.clone(),
            SupplyHandle::Rocks(supply) => supply.clone(),
        }
    }

    pub async fn snapshot(&self) -> Result<SupplyLedger> {
        self.source().supply_snapshot().await
    }

    pub fn issue(&self, amount: Decimal) -> Result<SupplyLedger> {
        let ledger = match self {
            SupplyHandle::Memory(supply) => supply.issue(amount)?,
            SupplyHandle::Rocks(supply) => supply.issue(amount)?,
        };
        info!(
            amount = %amount,
            consumed = %ledger.consumed_supply,
            remaining = %ledger.remaining_supply(),
            "Issued tokens"
        );
        Ok(ledger)
    }
}

/// Everything a command needs, wired from one `NodeConfig`
pub struct Services {
    pub wallets: Arc<dyn WalletStore>,
    pub supply: SupplyHandle,
    pub valuation: Arc<ValuationEngine>,
    pub processor: Arc<FeeProcessor>,
    db: Option<Arc<RocksDB>>,
}

impl Services {
    pub fn build(config: &NodeConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let (wallets, supply, db): (Arc<dyn WalletStore>, SupplyHandle, Option<Arc<RocksDB>>) =
            match config.storage.backend {
                StorageBackend::Memory => {
                    info!("Using in-memory storage; state is discarded on exit");
                    let supply = InMemorySupply::new(SupplyLedger::new(config.supply.total_supply));
                    (
                        Arc::new(InMemoryWalletStore::new()),
                        SupplyHandle::Memory(Arc::new(supply)),
                        None,
                    )
                }
                StorageBackend::Rocksdb => {
                    let dir = &config.storage.data_dir;
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("Failed to create data directory {:?}", dir))?;

                    let db = Arc::new(
                        RocksDB::open(&dir.join("ledger"))
                            .with_context(|| format!("Failed to open database in {:?}", dir))?,
                    );
                    let supply = RocksSupplyStore::open(db.clone(), config.supply.total_supply)?;
                    (
                        Arc::new(RocksWalletStore::new(db.clone())),
                        SupplyHandle::Rocks(Arc::new(supply)),
                        Some(db),
                    )
                }
            };

        let valuation = Arc::new(ValuationEngine::new(
            config.valuation.clone(),
            supply.source(),
        )?);
        let processor = Arc::new(FeeProcessor::new(
            config.fees.clone(),
            wallets.clone(),
            valuation.clone(),
            clock,
        )?);

        Ok(Self {
            wallets,
            supply,
            valuation,
            processor,
            db,
        })
    }

    /// Flush pending writes before the process exits
    pub fn flush(&self) -> Result<()> {
        if let Some(db) = &self.db {
            db.flush().context("Failed to flush database")?;
        }
        Ok(())
    }
}
