// stakeledger/core/storage/src/db/mod.rs

// Database module
pub mod column_families;
pub mod rocks_db;
pub mod supply_store;
pub mod wallet_store;

pub use rocks_db::RocksDB;
pub use supply_store::RocksSupplyStore;
pub use wallet_store::RocksWalletStore;
