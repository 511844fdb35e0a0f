// stakeledger/core/storage/src/error.rs

use rust_decimal::Decimal;
use stakeledger_economics::SupplyError;
use stakeledger_primitives::UserId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rocksdb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Missing column family: {0}")]
    MissingColumnFamily(&'static str),

    #[error("Wallet already exists: {0}")]
    WalletExists(UserId),

    #[error("Wallet not found: {0}")]
    WalletNotFound(UserId),

    #[error("Invalid wallet: {0}")]
    InvalidWallet(String),

    #[error("Balance of {user_id} would become negative: {balance} + {delta}")]
    NegativeBalance {
        user_id: UserId,
        balance: Decimal,
        delta: Decimal,
    },

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Supply ledger not initialized")]
    SupplyMissing,

    #[error("Supply error: {0}")]
    Supply(#[from] SupplyError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
