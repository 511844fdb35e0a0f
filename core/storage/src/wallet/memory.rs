// stakeledger/core/storage/src/wallet/memory.rs

use super::{sort_due, BalanceAdjustment, ChargeCommit, CommitResult, Wallet, WalletStore};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use stakeledger_primitives::UserId;
use tracing::debug;

/// Wallet store held in process memory.
///
/// Each record is guarded by its DashMap shard lock, so a compare-and-advance
/// on one wallet never blocks unrelated wallets in other shards.
#[derive(Debug, Default)]
pub struct InMemoryWalletStore {
    wallets: DashMap<UserId, Wallet>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn create_wallet(&self, wallet: Wallet) -> Result<(), StorageError> {
        wallet.validate()?;
        match self.wallets.entry(wallet.user_id.clone()) {
            Entry::Occupied(_) => Err(StorageError::WalletExists(wallet.user_id)),
            Entry::Vacant(slot) => {
                debug!("Created wallet {}", wallet.user_id);
                slot.insert(wallet);
                Ok(())
            }
        }
    }

    async fn get_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>, StorageError> {
        Ok(self.wallets.get(user_id).map(|w| w.value().clone()))
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Wallet>, StorageError> {
        let mut due: Vec<Wallet> = self
            .wallets
            .iter()
            .filter(|w| w.is_due(now))
            .map(|w| w.value().clone())
            .collect();
        sort_due(&mut due);
        Ok(due)
    }

    async fn commit_charge(
        &self,
        user_id: &UserId,
        charge: &ChargeCommit,
    ) -> Result<CommitResult, StorageError> {
        let mut wallet = self
            .wallets
            .get_mut(user_id)
            .ok_or_else(|| StorageError::WalletNotFound(user_id.clone()))?;
        wallet.try_apply_charge(charge)
    }

    async fn adjust_balances(
        &self,
        user_id: &UserId,
        adjustment: BalanceAdjustment,
    ) -> Result<Wallet, StorageError> {
        let mut wallet = self
            .wallets
            .get_mut(user_id)
            .ok_or_else(|| StorageError::WalletNotFound(user_id.clone()))?;
        let updated = wallet.try_adjust(&adjustment)?;
        *wallet = updated.clone();
        Ok(updated)
    }
}
