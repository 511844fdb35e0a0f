// stakeledger/core/storage/src/lib.rs

pub mod db;
pub mod error;
pub mod wallet;

pub use db::{RocksDB, RocksSupplyStore, RocksWalletStore};
pub use error::StorageError;
pub use wallet::{
    BalanceAdjustment, ChargeCommit, CommitResult, FeeDenomination, InMemoryWalletStore, Wallet,
    WalletStore, MAX_FEE_PERIOD_DAYS,
};
