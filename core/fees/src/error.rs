// stakeledger/core/fees/src/error.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use stakeledger_economics::ValuationError;
use stakeledger_primitives::UserId;
use stakeledger_storage::{StorageError, Wallet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeeError {
    #[error("Wallet not found: {0}")]
    NotFound(UserId),

    /// Another run advanced the due date first. Reported as a skip.
    #[error(
        "Due date of {user_id} changed concurrently (expected {expected}, found {})",
        .current.next_fee_due_at
    )]
    Conflict {
        user_id: UserId,
        expected: DateTime<Utc>,
        /// The record as the store now holds it
        current: Box<Wallet>,
    },

    /// Reported as a skip, never as a failure
    #[error("Insufficient balance for {user_id}: need {need}, have {have}")]
    InsufficientBalance {
        user_id: UserId,
        need: Decimal,
        have: Decimal,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Storage operation timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Valuation error: {0}")]
    Valuation(#[from] ValuationError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FeeError {
    /// Whether the next pass may succeed without operator action
    pub fn is_retryable(&self) -> bool {
        match self {
            FeeError::Timeout { .. } => true,
            FeeError::Valuation(ValuationError::LedgerUnavailable(_)) => true,
            FeeError::Storage(e) => !matches!(
                e,
                StorageError::InvalidWallet(_)
                    | StorageError::Overflow(_)
                    | StorageError::WalletExists(_)
                    | StorageError::WalletNotFound(_)
            ),
            _ => false,
        }
    }
}
