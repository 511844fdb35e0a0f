// stakeledger/core/storage/src/db/column_families.rs

/// One record per wallet, keyed by user id
pub const CF_WALLETS: &str = "wallets";

/// Singleton supply ledger record
pub const CF_SUPPLY: &str = "supply";

pub const ALL_CFS: &[&str] = &[CF_WALLETS, CF_SUPPLY];

/// Key of the supply ledger record inside `CF_SUPPLY`
pub const SUPPLY_LEDGER_KEY: &[u8] = b"ledger";
