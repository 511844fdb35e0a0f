// stakeledger/core/storage/src/wallet/mod.rs

pub mod memory;

pub use memory::InMemoryWalletStore;

use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stakeledger_primitives::UserId;

/// Longest fee period a wallet may carry (ten years)
pub const MAX_FEE_PERIOD_DAYS: u32 = 3_650;

/// Unit the recurring fee is quoted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeDenomination {
    /// Fee is an amount of base currency
    #[default]
    Base,
    /// Fee is a number of tokens, converted at the current price
    Token,
}

/// A user's balances and fee schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: UserId,
    pub base_balance: Decimal,
    pub token_balance: Decimal,
    pub fee_amount: Decimal,
    pub fee_denomination: FeeDenomination,
    pub fee_period_days: u32,
    pub next_fee_due_at: DateTime<Utc>,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// New empty wallet. The first fee falls due one period after creation.
    ///
    /// A period that runs past the representable date range leaves the due
    /// date at the maximum; `validate` rejects such a wallet.
    pub fn new(
        user_id: UserId,
        fee_amount: Decimal,
        fee_period_days: u32,
        fee_denomination: FeeDenomination,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            base_balance: Decimal::ZERO,
            token_balance: Decimal::ZERO,
            fee_amount,
            fee_denomination,
            fee_period_days,
            next_fee_due_at: created_at
                .checked_add_signed(Duration::days(fee_period_days as i64))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            last_processed_at: None,
            created_at,
        }
    }

    pub fn with_balances(mut self, base_balance: Decimal, token_balance: Decimal) -> Self {
        self.base_balance = base_balance;
        self.token_balance = token_balance;
        self
    }

    pub fn with_next_fee_due_at(mut self, at: DateTime<Utc>) -> Self {
        self.next_fee_due_at = at;
        self
    }

    pub fn fee_period(&self) -> Duration {
        Duration::days(self.fee_period_days as i64)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_fee_due_at <= now
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        if self.user_id.as_str().is_empty() {
            return Err(StorageError::InvalidWallet("empty user id".to_string()));
        }
        if self.fee_period_days == 0 {
            return Err(StorageError::InvalidWallet(format!(
                "{}: fee period must be at least one day",
                self.user_id
            )));
        }
        if self.fee_period_days > MAX_FEE_PERIOD_DAYS {
            return Err(StorageError::InvalidWallet(format!(
                "{}: fee period of {} days exceeds {}",
                self.user_id, self.fee_period_days, MAX_FEE_PERIOD_DAYS
            )));
        }
        if self.fee_amount < Decimal::ZERO {
            return Err(StorageError::InvalidWallet(format!(
                "{}: negative fee amount {}",
                self.user_id, self.fee_amount
            )));
        }
        if self.base_balance < Decimal::ZERO || self.token_balance < Decimal::ZERO {
            return Err(StorageError::InvalidWallet(format!(
                "{}: negative opening balance",
                self.user_id
            )));
        }
        Ok(())
    }

    /// Compare-and-advance against this record.
    ///
    /// Mutates only when the stored due date still equals the one the caller
    /// decided on and the balance still covers the amount.
    pub(crate) fn try_apply_charge(
        &mut self,
        charge: &ChargeCommit,
    ) -> Result<CommitResult, StorageError> {
        if self.next_fee_due_at != charge.expected_due {
            return Ok(CommitResult::Conflict {
                current: self.clone(),
            });
        }
        if self.base_balance < charge.amount {
            return Ok(CommitResult::InsufficientBalance {
                balance: self.base_balance,
            });
        }

        let base_balance = self.base_balance.checked_sub(charge.amount).ok_or_else(|| {
            StorageError::Overflow(format!("{}: debit of {}", self.user_id, charge.amount))
        })?;
        let next_fee_due_at = charge
            .expected_due
            .checked_add_signed(self.fee_period())
            .ok_or_else(|| {
                StorageError::Overflow(format!(
                    "{}: due date {} plus {} days",
                    self.user_id, charge.expected_due, self.fee_period_days
                ))
            })?;

        let mut updated = self.clone();
        updated.base_balance = base_balance;
        updated.next_fee_due_at = next_fee_due_at;
        updated.last_processed_at = Some(charge.processed_at);

        *self = updated.clone();
        Ok(CommitResult::Committed(updated))
    }

    pub(crate) fn try_adjust(&self, adjustment: &BalanceAdjustment) -> Result<Wallet, StorageError> {
        let base_balance = self
            .base_balance
            .checked_add(adjustment.base_delta)
            .ok_or_else(|| {
                StorageError::Overflow(format!(
                    "{}: base balance {} + {}",
                    self.user_id, self.base_balance, adjustment.base_delta
                ))
            })?;
        if base_balance < Decimal::ZERO {
            return Err(StorageError::NegativeBalance {
                user_id: self.user_id.clone(),
                balance: self.base_balance,
                delta: adjustment.base_delta,
            });
        }
        let token_balance = self
            .token_balance
            .checked_add(adjustment.token_delta)
            .ok_or_else(|| {
                StorageError::Overflow(format!(
                    "{}: token balance {} + {}",
                    self.user_id, self.token_balance, adjustment.token_delta
                ))
            })?;
        if token_balance < Decimal::ZERO {
            return Err(StorageError::NegativeBalance {
                user_id: self.user_id.clone(),
                balance: self.token_balance,
                delta: adjustment.token_delta,
            });
        }

        let mut updated = self.clone();
        updated.base_balance = base_balance;
        updated.token_balance = token_balance;
        Ok(updated)
    }
}

/// A fee debit the processor wants to land
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeCommit {
    /// Due date observed when the decision to charge was made
    pub expected_due: DateTime<Utc>,
    /// Base-currency amount to debit
    pub amount: Decimal,
    pub processed_at: DateTime<Utc>,
}

/// Result of a compare-and-advance
#[derive(Debug, Clone, PartialEq)]
pub enum CommitResult {
    /// Debit applied and due date advanced by one period
    Committed(Wallet),
    /// Due date moved since it was read; `current` is the stored record
    Conflict { current: Wallet },
    /// Balance no longer covers the amount
    InsufficientBalance { balance: Decimal },
}

/// Deposit/withdrawal deltas. Never touches the fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BalanceAdjustment {
    pub base_delta: Decimal,
    pub token_delta: Decimal,
}

impl BalanceAdjustment {
    pub fn base(delta: Decimal) -> Self {
        Self {
            base_delta: delta,
            token_delta: Decimal::ZERO,
        }
    }

    pub fn token(delta: Decimal) -> Self {
        Self {
            base_delta: Decimal::ZERO,
            token_delta: delta,
        }
    }
}

/// Persistent wallet state shared by every fee trigger.
///
/// `commit_charge` is the only path allowed to debit fees or move
/// `next_fee_due_at`.
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn create_wallet(&self, wallet: Wallet) -> Result<(), StorageError>;

    async fn get_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>, StorageError>;

    /// Wallets with `next_fee_due_at <= now`, oldest due first
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Wallet>, StorageError>;

    async fn commit_charge(
        &self,
        user_id: &UserId,
        charge: &ChargeCommit,
    ) -> Result<CommitResult, StorageError>;

    async fn adjust_balances(
        &self,
        user_id: &UserId,
        adjustment: BalanceAdjustment,
    ) -> Result<Wallet, StorageError>;
}

pub(crate) fn sort_due(wallets: &mut [Wallet]) {
    wallets.sort_by(|a, b| {
        a.next_fee_due_at
            .cmp(&b.next_fee_due_at)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_wallet_due_after_one_period() {
        let wallet = Wallet::new(
            UserId::from("alice"),
            Decimal::from(10),
            30,
            FeeDenomination::Base,
            start(),
        );
        assert_eq!(wallet.next_fee_due_at, start() + Duration::days(30));
        assert!(!wallet.is_due(start()));
        assert!(wallet.is_due(start() + Duration::days(30)));
    }

    #[test]
    fn test_validate_rejects_zero_period() {
        let wallet = Wallet::new(
            UserId::from("bob"),
            Decimal::from(10),
            0,
            FeeDenomination::Base,
            start(),
        );
        assert!(matches!(wallet.validate(), Err(StorageError::InvalidWallet(_))));
    }

    #[test]
    fn test_apply_charge_advances_from_prior_due() {
        let due = start() - Duration::days(1);
        let mut wallet = Wallet::new(
            UserId::from("carol"),
            Decimal::from(10),
            30,
            FeeDenomination::Base,
            start() - Duration::days(31),
        )
        .with_balances(Decimal::from(100), Decimal::ZERO)
        .with_next_fee_due_at(due);

        let charge = ChargeCommit {
            expected_due: due,
            amount: Decimal::from(10),
            processed_at: start(),
        };
        match wallet.try_apply_charge(&charge).unwrap() {
            CommitResult::Committed(updated) => {
                assert_eq!(updated.base_balance, Decimal::from(90));
                assert_eq!(updated.next_fee_due_at, due + Duration::days(30));
                assert_eq!(updated.last_processed_at, Some(start()));
            }
            other => panic!("unexpected {:?}", other),
        }

        // Same decision replayed: the due date moved on
        match wallet.try_apply_charge(&charge).unwrap() {
            CommitResult::Conflict { current } => {
                assert_eq!(current.base_balance, Decimal::from(90));
                assert_eq!(current.next_fee_due_at, due + Duration::days(30));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(wallet.base_balance, Decimal::from(90));
    }

    #[test]
    fn test_apply_charge_insufficient_leaves_wallet() {
        let due = start();
        let mut wallet = Wallet::new(
            UserId::from("dave"),
            Decimal::from(10),
            30,
            FeeDenomination::Base,
            start() - Duration::days(30),
        )
        .with_balances(Decimal::from(5), Decimal::ZERO);
        let before = wallet.clone();

        let result = wallet
            .try_apply_charge(&ChargeCommit {
                expected_due: due,
                amount: Decimal::from(10),
                processed_at: start(),
            })
            .unwrap();
        assert!(matches!(result, CommitResult::InsufficientBalance { .. }));
        assert_eq!(wallet, before);
    }

    #[test]
    fn test_adjust_rejects_overdraw() {
        let wallet = Wallet::new(
            UserId::from("erin"),
            Decimal::from(1),
            7,
            FeeDenomination::Base,
            start(),
        )
        .with_balances(Decimal::from(3), Decimal::from(2));

        let updated = wallet
            .try_adjust(&BalanceAdjustment::base(Decimal::from(-3)))
            .unwrap();
        assert_eq!(updated.base_balance, Decimal::ZERO);
        assert_eq!(updated.next_fee_due_at, wallet.next_fee_due_at);

        assert!(matches!(
            wallet.try_adjust(&BalanceAdjustment::token(Decimal::from(-5))),
            Err(StorageError::NegativeBalance { .. })
        ));
    }

    #[test]
    fn test_oversized_period_rejected_without_panic() {
        let wallet = Wallet::new(
            UserId::from("frank"),
            Decimal::from(1),
            200_000_000,
            FeeDenomination::Base,
            start(),
        );
        assert_eq!(wallet.next_fee_due_at, DateTime::<Utc>::MAX_UTC);
        assert!(matches!(wallet.validate(), Err(StorageError::InvalidWallet(_))));

        let longest = Wallet::new(
            UserId::from("grace"),
            Decimal::from(1),
            MAX_FEE_PERIOD_DAYS,
            FeeDenomination::Base,
            start(),
        );
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn test_adjust_overflow_is_an_error() {
        let wallet = Wallet::new(
            UserId::from("heidi"),
            Decimal::from(1),
            30,
            FeeDenomination::Base,
            start(),
        )
        .with_balances(Decimal::MAX, Decimal::MAX);

        assert!(matches!(
            wallet.try_adjust(&BalanceAdjustment::base(Decimal::ONE)),
            Err(StorageError::Overflow(_))
        ));
        assert!(matches!(
            wallet.try_adjust(&BalanceAdjustment::token(Decimal::ONE)),
            Err(StorageError::Overflow(_))
        ));
    }

    #[test]
    fn test_charge_past_last_date_is_an_error() {
        let due = DateTime::<Utc>::MAX_UTC - Duration::days(1);
        let mut wallet = Wallet::new(
            UserId::from("ivan"),
            Decimal::from(1),
            30,
            FeeDenomination::Base,
            start(),
        )
        .with_balances(Decimal::from(10), Decimal::ZERO)
        .with_next_fee_due_at(due);
        let before = wallet.clone();

        let result = wallet.try_apply_charge(&ChargeCommit {
            expected_due: due,
            amount: Decimal::ONE,
            processed_at: start(),
        });
        assert!(matches!(result, Err(StorageError::Overflow(_))));
        assert_eq!(wallet, before);
    }
}
