// stakeledger/core/storage/src/db/supply_store.rs

use crate::db::{
    column_families::{CF_SUPPLY, SUPPLY_LEDGER_KEY},
    RocksDB,
};
use crate::error::StorageError;
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use stakeledger_economics::{SupplyLedger, SupplySource};
use std::sync::Arc;
use tracing::info;

/// Persisted singleton supply ledger
pub struct RocksSupplyStore {
    db: Arc<RocksDB>,
    write_lock: Mutex<()>,
}

impl RocksSupplyStore {
    /// Open the ledger, seeding it with `total_supply` on first use
    pub fn open(db: Arc<RocksDB>, total_supply: Decimal) -> Result<Self, StorageError> {
        let store = Self {
            db,
            write_lock: Mutex::new(()),
        };
        if store.load()?.is_none() {
            store.save(&SupplyLedger::new(total_supply))?;
            info!("Initialized supply ledger with total supply {}", total_supply);
        }
        Ok(store)
    }

    pub fn load(&self) -> Result<Option<SupplyLedger>, StorageError> {
        load_ledger(&self.db)
    }

    fn save(&self, ledger: &SupplyLedger) -> Result<(), StorageError> {
        let bytes = bincode::serialize(ledger)?;
        self.db.put_cf(CF_SUPPLY, SUPPLY_LEDGER_KEY, &bytes)
    }

    /// Record a token issuance against the ledger
    pub fn issue(&self, amount: Decimal) -> Result<SupplyLedger, StorageError> {
        let _guard = self.write_lock.lock();
        let mut ledger = self.load()?.ok_or(StorageError::SupplyMissing)?;
        ledger.issue(amount)?;
        self.save(&ledger)?;
        Ok(ledger)
    }
}

#[async_trait]
impl SupplySource for RocksSupplyStore {
    async fn supply_snapshot(&self) -> anyhow::Result<SupplyLedger> {
        let db = self.db.clone();
        let ledger = tokio::task::spawn_blocking(move || load_ledger(&db)).await??;
        Ok(ledger.ok_or(StorageError::SupplyMissing)?)
    }
}

fn load_ledger(db: &RocksDB) -> Result<Option<SupplyLedger>, StorageError> {
    match db.get_cf(CF_SUPPLY, SUPPLY_LEDGER_KEY)? {
        Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
        None => Ok(None),
    }
}
