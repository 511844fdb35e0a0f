// stakeledger/core/storage/src/db/wallet_store.rs

use crate::db::{column_families::CF_WALLETS, RocksDB};
use crate::error::StorageError;
use crate::wallet::{sort_due, BalanceAdjustment, ChargeCommit, CommitResult, Wallet, WalletStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use stakeledger_primitives::UserId;
use std::sync::Arc;
use tracing::debug;

/// RocksDB-backed wallet store.
///
/// Read-modify-write cycles hold a lock scoped to the one wallet being
/// touched; the record itself is written with a single put. Trait calls run
/// on tokio's blocking pool.
#[derive(Clone)]
pub struct RocksWalletStore {
    db: Arc<RocksDB>,
    locks: Arc<DashMap<UserId, Arc<Mutex<()>>>>,
}

impl RocksWalletStore {
    pub fn new(db: Arc<RocksDB>) -> Self {
        Self {
            db,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        F: FnOnce(&RocksWalletStore) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| StorageError::Unavailable(format!("storage task failed: {}", e)))?
    }

    fn read(&self, user_id: &UserId) -> Result<Option<Wallet>, StorageError> {
        match self.db.get_cf(CF_WALLETS, user_id.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, wallet: &Wallet) -> Result<(), StorageError> {
        let bytes = bincode::serialize(wallet)?;
        self.db.put_cf(CF_WALLETS, wallet.user_id.as_bytes(), &bytes)
    }

    fn create_sync(&self, wallet: Wallet) -> Result<(), StorageError> {
        let lock = self.lock_for(&wallet.user_id);
        let _guard = lock.lock();

        if self.db.exists_cf(CF_WALLETS, wallet.user_id.as_bytes())? {
            return Err(StorageError::WalletExists(wallet.user_id));
        }
        self.write(&wallet)?;
        debug!("Stored wallet {}", wallet.user_id);
        Ok(())
    }

    fn list_due_sync(&self, now: DateTime<Utc>) -> Result<Vec<Wallet>, StorageError> {
        let mut due = Vec::new();
        for bytes in self.db.values_cf(CF_WALLETS)? {
            let wallet: Wallet = bincode::deserialize(&bytes)?;
            if wallet.is_due(now) {
                due.push(wallet);
            }
        }
        sort_due(&mut due);
        Ok(due)
    }

    fn commit_sync(
        &self,
        user_id: &UserId,
        charge: &ChargeCommit,
    ) -> Result<CommitResult, StorageError> {
        let lock = self.lock_for(user_id);
        let _guard = lock.lock();

        let mut wallet = self
            .read(user_id)?
            .ok_or_else(|| StorageError::WalletNotFound(user_id.clone()))?;

        let result = wallet.try_apply_charge(charge)?;
        if let CommitResult::Committed(updated) = &result {
            // A failed put leaves the stored record untouched
            self.write(updated)?;
        }
        Ok(result)
    }

    fn adjust_sync(
        &self,
        user_id: &UserId,
        adjustment: &BalanceAdjustment,
    ) -> Result<Wallet, StorageError> {
        let lock = self.lock_for(user_id);
        let _guard = lock.lock();

        let wallet = self
            .read(user_id)?
            .ok_or_else(|| StorageError::WalletNotFound(user_id.clone()))?;
        let updated = wallet.try_adjust(adjustment)?;
        self.write(&updated)?;
        Ok(updated)
    }
}

#[async_trait]
impl WalletStore for RocksWalletStore {
    async fn create_wallet(&self, wallet: Wallet) -> Result<(), StorageError> {
        wallet.validate()?;
        self.blocking(move |store| store.create_sync(wallet)).await
    }

    async fn get_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>, StorageError> {
        let user_id = user_id.clone();
        self.blocking(move |store| store.read(&user_id)).await
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Wallet>, StorageError> {
        self.blocking(move |store| store.list_due_sync(now)).await
    }

    async fn commit_charge(
        &self,
        user_id: &UserId,
        charge: &ChargeCommit,
    ) -> Result<CommitResult, StorageError> {
        let user_id = user_id.clone();
        let charge = *charge;
        self.blocking(move |store| store.commit_sync(&user_id, &charge))
            .await
    }

    async fn adjust_balances(
        &self,
        user_id: &UserId,
        adjustment: BalanceAdjustment,
    ) -> Result<Wallet, StorageError> {
        let user_id = user_id.clone();
        self.blocking(move |store| store.adjust_sync(&user_id, &adjustment))
            .await
    }
}
