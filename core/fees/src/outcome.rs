// stakeledger/core/fees/src/outcome.rs

use crate::error::FeeError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stakeledger_primitives::UserId;
use stakeledger_storage::Wallet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeStatus {
    Charged,
    SkippedNotDue,
    SkippedInsufficientBalance,
    Failed,
}

impl FeeStatus {
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            FeeStatus::SkippedNotDue | FeeStatus::SkippedInsufficientBalance
        )
    }
}

impl fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeeStatus::Charged => "CHARGED",
            FeeStatus::SkippedNotDue => "SKIPPED_NOT_DUE",
            FeeStatus::SkippedInsufficientBalance => "SKIPPED_INSUFFICIENT_BALANCE",
            FeeStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Result of one processing attempt on one wallet. Logged, not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeOutcome {
    pub user_id: UserId,
    pub status: FeeStatus,
    /// Base-currency amount charged, or that would have been charged
    pub amount: Decimal,
    /// Base balance after this attempt
    pub new_balance: Decimal,
    pub next_fee_due_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub retryable: bool,
}

impl FeeOutcome {
    pub fn charged(updated: &Wallet, amount: Decimal) -> Self {
        Self::from_wallet(updated, FeeStatus::Charged, amount)
    }

    pub fn not_due(wallet: &Wallet) -> Self {
        Self::from_wallet(wallet, FeeStatus::SkippedNotDue, Decimal::ZERO)
    }

    /// Another run charged first; `current` is the record the store now holds
    pub fn conflicted(current: &Wallet) -> Self {
        Self::not_due(current)
    }

    pub fn insufficient(wallet: &Wallet, amount: Decimal, balance: Decimal) -> Self {
        let mut outcome = Self::from_wallet(wallet, FeeStatus::SkippedInsufficientBalance, amount);
        outcome.new_balance = balance;
        outcome
    }

    pub fn failed(wallet: &Wallet, err: &FeeError) -> Self {
        let mut outcome = Self::from_wallet(wallet, FeeStatus::Failed, Decimal::ZERO);
        outcome.error = Some(err.to_string());
        outcome.retryable = err.is_retryable();
        outcome
    }

    fn from_wallet(wallet: &Wallet, status: FeeStatus, amount: Decimal) -> Self {
        Self {
            user_id: wallet.user_id.clone(),
            status,
            amount,
            new_balance: wallet.base_balance,
            next_fee_due_at: wallet.next_fee_due_at,
            error: None,
            retryable: false,
        }
    }
}
